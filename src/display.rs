//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Console progress output shared by every tool.

use crate::error::Error;
use crate::knob::{Knob, KnobValue};
use ansi_term::Color::{Blue, Cyan, Green, Red, White, Yellow};
use std::path::Path;
use std::time::Duration;

// padding to where detail lines should start
const PAD_TO_START_OF_LINE: &str = "        ";

fn list(values: &[KnobValue]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Announces the start of a knob's sweep.
pub fn print_knob_header(knob: &Knob, values: &[KnobValue], chunks: usize) {
    let starting = Green.bold().paint("Starting");
    let name = White.bold().paint(knob.name());
    let count = values.len();

    println!(
        "     {starting} knob '{name}' (default {}) with {count} values over {chunks} chunks",
        knob.baseline()
    );
    println!("{PAD_TO_START_OF_LINE}values: [{}]", Cyan.paint(list(values)));
}

/// Reports that one value has been measured on one sample.
pub fn print_value_collected(knob: &str, value: KnobValue, sample: usize) {
    let line = format!("collected stats for {knob} = {value} on sample {sample}");

    println!("{PAD_TO_START_OF_LINE}{}", Yellow.paint(line));
}

/// Reports that a worker handed its chunk back.
pub fn print_chunk_finished(knob: &str, chunk: usize) {
    let done = Blue.paint("done");

    println!("{PAD_TO_START_OF_LINE}{done} chunk {chunk} of '{knob}'");
}

/// Reports a knob whose results were exported.
pub fn print_knob_finished(knob: &str, exported: usize, path: &Path) {
    let finished = Green.bold().paint("Finished");
    let name = White.bold().paint(knob);

    println!(
        "     {finished} knob '{name}', {exported} statistics written to {}",
        Blue.paint(path.display().to_string())
    );
}

/// Reports a statistic that isn't on any reference table.
pub fn print_unknown_stat(key: &str) {
    let prefix = Red.bold().paint("unknown statistic:");

    println!("{PAD_TO_START_OF_LINE}{prefix} '{key}' is not in any reference table");
}

/// Reports a round-tripped corpus sample and the stats file it went to.
pub fn print_sample_collected(index: usize, stats: &Path) {
    let wrote = Cyan.bold().paint("Collected");

    println!(
        "     {wrote} sample {index} into {}",
        Blue.paint(stats.display().to_string())
    );
}

/// Reports a statistics directory that was read during analysis.
pub fn print_directory_collected(directory: &Path) {
    let line = format!("collected stats for directory {}", directory.display());

    println!("{PAD_TO_START_OF_LINE}{}", Green.paint(line));
}

/// Reports a resolved knob declaration.
pub fn print_knob_decoded(identifier: &str, value: &str) {
    let decoded = Green.bold().paint("Decoded");

    println!("     {decoded} {} = {value}", White.bold().paint(identifier));
}

/// Prints a recoverable problem.
pub fn print_warning(message: &str) {
    let prefix = Yellow.bold().paint("warning:");

    eprintln!("{PAD_TO_START_OF_LINE}{prefix} {message}");
}

/// Prints an error, fatal or not.
pub fn print_error(err: &Error) {
    let prefix = Red.bold().paint("error:");

    eprintln!("{prefix} {}", Red.paint(err.to_string()));
}

/// Prints the closing summary line of a tool.
pub fn print_summary(what: &str, count: usize, elapsed: Duration) {
    let summary = Green.bold().paint("Summary");
    let count = Blue.paint(count.to_string());
    let time = format!("{:11}s", elapsed.as_secs_f32());

    println!("     {summary} [ {time} ] {count} {what} processed");
}
