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
use knobstudy::analysis;
use knobstudy::cli;
use knobstudy::config::AnalysisConfig;
use knobstudy::display;
use std::process::ExitCode;

fn analysis_config() -> impl Parser<AnalysisConfig> {
    let defaults = AnalysisConfig::default();
    let directories = cli::path(
        "directories",
        "directory of <knob>.txt lists of statistics directories",
        defaults.directories,
    );
    let references = cli::references();
    let missing_log = cli::missing_log();
    let max_stats_index = cli::count(
        "max-stats-index",
        "the highest n of a stats_<n>.txt file that is read",
        defaults.max_stats_index,
    );

    bpaf::construct!(directories, references, missing_log, max_stats_index).map(
        move |(directories, references, missing_log, max_stats_index)| AnalysisConfig {
            directories,
            output: defaults.output.clone(),
            references,
            missing_log,
            max_stats_index,
        },
    )
}

fn main() -> ExitCode {
    #[cfg(windows)]
    ansi_term::enable_ansi_support().expect("unable to enable ANSI");

    let (mut config, options) = cli::tool_with(
        "aggregates collected statistics directories into per-knob result tables",
        "analyze-stats [options] [-o <RESULTS DIR>]",
        analysis_config(),
    )
    .run();

    if let Some(output) = options.output {
        config.output = output;
    }

    match analysis::run_analysis(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            display::print_error(&err);

            ExitCode::from(1)
        }
    }
}
