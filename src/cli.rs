//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Contains utility code specifically for the CLI tools located in
//! the `tools/` subdirectory.
//!
//! All of these tools have similar command-line arguments and they all
//! should look/feel uniform, so most of the code is pulled into this
//! module and then used in the drivers of the different tools.
//!
//! Every path option falls back to the relative path the study has always
//! used, so the tools can be run from the study directory without arguments.

use crate::reference::ReferencePaths;
use crate::toolchain::Toolchain;
use bpaf::{construct, OptionParser, Parser};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Basic options that every CLI tool in the suite takes in.
pub struct BaseOptions {
    /// Where the tool should put its results, if not the default
    pub output: Option<PathBuf>,
    /// Whether or not to run the logging in verbose mode. Only `knob-sweep`
    /// has anything extra to say, the other tools accept and ignore it.
    pub verbose: bool,
}

/// Returns a [`OptionParser`] preconfigured with the standard knobstudy
/// options and additional tool-specific options.
pub fn tool_with<T>(
    description: &'static str,
    usage: &'static str,
    additional: impl Parser<T> + 'static,
) -> OptionParser<(T, BaseOptions)> {
    let res = construct!(additional, default());

    res.to_options()
        .descr(description)
        .version(VERSION)
        .usage(usage)
}

/// Gets the baseline default options that every tool needs.
pub fn default() -> impl Parser<BaseOptions> {
    let output = output();
    let verbose = verbose();

    construct!(BaseOptions { output, verbose })
}

/// Gets the output location specified on the CLI, if one exists.
pub fn output() -> impl Parser<Option<PathBuf>> {
    bpaf::long("output")
        .short('o')
        .help("where to write results")
        .argument::<PathBuf>("PATH")
        .optional()
}

/// Checks for the presence of `-v` or `--verbose`
pub fn verbose() -> impl Parser<bool> {
    bpaf::long("verbose")
        .short('v')
        .help("enable verbose output (knob-sweep reports every value it finishes)")
        .flag(true, false)
}

/// Gets the number of concurrent threads to use for a given task
pub fn jobs() -> impl Parser<Option<usize>> {
    bpaf::long("jobs")
        .short('j')
        .help("the number of concurrent jobs to sweep chunks on")
        .argument::<usize>("JOBS")
        .optional()
}

/// A path option that falls back to `default`.
pub fn path(name: &'static str, help: &'static str, default: PathBuf) -> impl Parser<PathBuf> {
    bpaf::long(name)
        .help(help)
        .argument::<PathBuf>("PATH")
        .fallback(default)
        .debug_fallback()
}

/// A count option that falls back to `default`.
pub fn count(name: &'static str, help: &'static str, default: usize) -> impl Parser<usize> {
    bpaf::long(name)
        .help(help)
        .argument::<usize>("N")
        .fallback(default)
        .display_fallback()
}

/// The three reference tables statistics are classified against.
pub fn references() -> impl Parser<ReferencePaths> {
    let defaults = ReferencePaths::default();
    let important = path(
        "important",
        "table of statistics worth keeping",
        defaults.important,
    );
    let ambiguous = path(
        "ambiguous",
        "table of statistics without a clear direction",
        defaults.ambiguous,
    );
    let ignored = path(
        "ignored",
        "table of statistics that are always dropped",
        defaults.ignored,
    );

    construct!(ReferencePaths {
        important,
        ambiguous,
        ignored,
    })
}

/// The log unclassified statistics are appended to.
pub fn missing_log() -> impl Parser<PathBuf> {
    path(
        "missing-log",
        "where statistics missing from every table are logged",
        PathBuf::from("missing_stats.txt"),
    )
}

/// The LLVM tools to drive, found in an LLVM build's `bin/` directory.
/// `opt` runs under `profiler` unless `--profiler` says otherwise, an empty
/// string runs it directly.
pub fn toolchain(profiler: &'static str) -> impl Parser<Toolchain> {
    let bin = path(
        "llvm-bin",
        "directory containing opt, llvm-dis and llvm-as",
        PathBuf::from("./build/bin"),
    );
    let profiler = bpaf::long("profiler")
        .help("command opt is run under for timing, empty to disable timing")
        .argument::<String>("CMD")
        .fallback(profiler.to_string())
        .display_fallback()
        .map(|cmd| cmd.split_whitespace().map(str::to_string).collect::<Vec<_>>());

    construct!(bin, profiler)
        .map(|(bin, profiler)| Toolchain::from_bin_dir(bin).with_profiler(profiler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_options_fall_back() {
        let parser = construct!(references(), missing_log()).to_options();
        let (refs, log) = parser.run_inner(&["--ignored", "custom.txt"]).unwrap();

        assert_eq!(refs.important, PathBuf::from("stats_imp.txt"));
        assert_eq!(refs.ignored, PathBuf::from("custom.txt"));
        assert_eq!(log, PathBuf::from("missing_stats.txt"));
    }

    #[test]
    fn profiler_is_split_into_words() {
        let parser = toolchain("perf stat").to_options();

        let tools = parser.run_inner(&["--profiler", "sudo perf stat"]).unwrap();
        assert_eq!(tools.profiler, ["sudo", "perf", "stat"]);

        let nothing: &[&str] = &[];
        let tools = parser.run_inner(nothing).unwrap();
        assert_eq!(tools.opt, PathBuf::from("./build/bin/opt"));
        assert_eq!(tools.profiler, ["perf", "stat"]);
    }

    #[test]
    fn empty_profiler_runs_opt_directly() {
        let nothing: &[&str] = &[];
        let tools = toolchain("").to_options().run_inner(nothing).unwrap();

        assert!(tools.profiler.is_empty());

        let tools = toolchain("")
            .to_options()
            .run_inner(&["--profiler", "perf stat"])
            .unwrap();

        assert_eq!(tools.profiler, ["perf", "stat"]);
    }

    #[test]
    fn base_options() {
        let parser = tool_with("test", "test", jobs());
        let (jobs, options) = parser.run_inner(&["-j", "4", "-v"]).unwrap();

        assert_eq!(jobs, Some(4));
        assert!(options.verbose);
        assert!(options.output.is_none());
    }
}
