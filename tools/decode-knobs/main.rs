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
use knobstudy::config::DecodeConfig;
use knobstudy::decode;
use knobstudy::display;
use std::process::ExitCode;

fn decode_config() -> impl Parser<DecodeConfig> {
    let defaults = DecodeConfig::default();
    let llvm_root = cli::path(
        "llvm-root",
        "root of the LLVM checkout knob locations are relative to",
        defaults.llvm_root,
    );
    let locations = cli::path(
        "locations",
        "'path:line:col name' locations of cl::opt declarations",
        defaults.locations,
    );

    bpaf::construct!(llvm_root, locations).map(move |(llvm_root, locations)| DecodeConfig {
        llvm_root,
        locations,
        output: defaults.output.clone(),
    })
}

fn main() -> ExitCode {
    #[cfg(windows)]
    ansi_term::enable_ansi_support().expect("unable to enable ANSI");

    let (mut config, options) = cli::tool_with(
        "recovers knob identifiers and defaults from LLVM sources",
        "decode-knobs [--llvm-root <DIR>] [--locations <FILE>] [-o <FILE>]",
        decode_config(),
    )
    .run();

    if let Some(output) = options.output {
        config.output = output;
    }

    match decode::decode_knobs(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            display::print_error(&err);

            ExitCode::from(1)
        }
    }
}
