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
use knobstudy::collect;
use knobstudy::config::CollectConfig;
use knobstudy::display;
use std::process::ExitCode;

fn collect_config() -> impl Parser<CollectConfig> {
    let defaults = CollectConfig::default();
    let source = cli::path(
        "source",
        "directory of raw .bc files to sample",
        defaults.source,
    );
    let limit = cli::count(
        "limit",
        "the maximum number of samples to collect",
        defaults.limit,
    );
    let bitcode = cli::path(
        "bitcode",
        "directory round-tripped samples are written to",
        defaults.bitcode,
    );
    let files_per_stats = cli::count(
        "files-per-stats",
        "the number of samples sharing one stats file",
        defaults.files_per_stats,
    );

    bpaf::construct!(source, limit, bitcode, files_per_stats).map(
        move |(source, limit, bitcode, files_per_stats)| CollectConfig {
            source,
            limit,
            bitcode,
            stats: defaults.stats.clone(),
            files_per_stats,
        },
    )
}

fn main() -> ExitCode {
    #[cfg(windows)]
    ansi_term::enable_ansi_support().expect("unable to enable ANSI");

    let toolchain = cli::toolchain("");
    let config = collect_config();
    let ((tools, mut config), options) = cli::tool_with(
        "round-trips bitcode into a numbered sample corpus and records its statistics",
        "collect-stats [options] [-o <STATS DIR>]",
        bpaf::construct!(toolchain, config),
    )
    .run();

    if let Some(stats) = options.output {
        config.stats = stats;
    }

    match collect::collect_corpus(&config, &tools) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            display::print_error(&err);

            ExitCode::from(1)
        }
    }
}
