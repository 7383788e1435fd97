//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use bpaf::Parser;
use knobstudy::cli;
use knobstudy::config::SweepConfig;
use knobstudy::display;
use knobstudy::study;
use std::process::ExitCode;
use std::sync::Arc;

fn sweep_config() -> impl Parser<SweepConfig> {
    let defaults = SweepConfig::default();
    let knob_table = cli::path(
        "knob-table",
        "the 'identifier: value' table of knob defaults",
        defaults.knob_table,
    );
    let knob_list = cli::path(
        "knob-list",
        "the knobs to sweep, one identifier per line",
        defaults.knob_list,
    );
    let references = cli::references();
    let corpus = cli::path(
        "corpus",
        "directory of test_<n>.bc samples",
        defaults.corpus,
    );
    let invalid_log = cli::path(
        "invalid-log",
        "where knobs opt rejected a value for are logged",
        defaults.invalid_log,
    );
    let missing_log = cli::missing_log();
    let total_files = cli::count(
        "total-files",
        "the number of samples in the corpus",
        defaults.total_files,
    );
    let chunk_size = cli::count(
        "chunk-size",
        "the number of samples handed to one job",
        defaults.chunk_size,
    );
    let jobs = cli::jobs();

    bpaf::construct!(
        knob_table,
        knob_list,
        references,
        corpus,
        invalid_log,
        missing_log,
        total_files,
        chunk_size,
        jobs
    )
    .map(
        move |(
            knob_table,
            knob_list,
            references,
            corpus,
            invalid_log,
            missing_log,
            total_files,
            chunk_size,
            jobs,
        )| SweepConfig {
            knob_table,
            knob_list,
            references,
            corpus,
            results: defaults.results.clone(),
            invalid_log,
            missing_log,
            total_files,
            chunk_size,
            jobs,
            verbose: false,
        },
    )
}

fn main() -> ExitCode {
    #[cfg(windows)]
    ansi_term::enable_ansi_support().expect("unable to enable ANSI");

    let toolchain = cli::toolchain("perf stat");
    let config = sweep_config();
    let ((tools, mut config), options) = cli::tool_with(
        "sweeps LLVM knobs over a bitcode corpus and exports the statistics that move",
        "knob-sweep [options] [-o <RESULTS DIR>]",
        bpaf::construct!(toolchain, config),
    )
    .run();

    config.verbose = options.verbose;

    if let Some(results) = options.output {
        config.results = results;
    }

    match study::run_sweep(&config, Arc::new(tools)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            display::print_error(&err);

            ExitCode::from(1)
        }
    }
}
