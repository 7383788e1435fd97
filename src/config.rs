//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Run configuration and the plain-text files it points at.
//!
//! Every path defaults to the relative location the study has always used,
//! so running a tool from the study directory without arguments does the
//! expected thing.

use crate::error::{Error, Result};
use crate::knob::Knob;
use crate::reference::ReferencePaths;
use crate::stats::SaHashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for sweeping knobs over the corpus.
#[derive(Clone, Debug)]
pub struct SweepConfig {
    /// `identifier: value` table of every known knob
    pub knob_table: PathBuf,
    /// Identifiers of the knobs to sweep, one per line
    pub knob_list: PathBuf,
    /// The curated statistic tables
    pub references: ReferencePaths,
    /// Directory of round-tripped `test_<n>.bc` samples
    pub corpus: PathBuf,
    /// Directory `<knob>.json` files are written to
    pub results: PathBuf,
    /// Log of knobs `opt` rejected a value for
    pub invalid_log: PathBuf,
    /// Log of statistics missing from the reference tables
    pub missing_log: PathBuf,
    /// Number of samples in the corpus
    pub total_files: usize,
    /// Number of samples handed to one job
    pub chunk_size: usize,
    /// Size of the worker pool, `None` for one per CPU
    pub jobs: Option<usize>,
    /// Whether to print per-value progress
    pub verbose: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            knob_table: PathBuf::from("knobs_decoded.txt"),
            knob_list: PathBuf::from("run_knobs_with_new_arch.txt"),
            references: ReferencePaths::default(),
            corpus: PathBuf::from("bitcode"),
            results: PathBuf::from("results"),
            invalid_log: PathBuf::from("invalid_knobs.txt"),
            missing_log: PathBuf::from("missing_stats.txt"),
            total_files: 100,
            chunk_size: 10,
            jobs: None,
            verbose: false,
        }
    }
}

/// Configuration for building the sample corpus.
#[derive(Clone, Debug)]
pub struct CollectConfig {
    /// Directory of raw `.bc` files to draw samples from
    pub source: PathBuf,
    /// Maximum number of samples to collect
    pub limit: usize,
    /// Directory round-tripped samples are written to
    pub bitcode: PathBuf,
    /// Directory `stats_<n>.txt` files are written to
    pub stats: PathBuf,
    /// Number of samples whose statistics share one stats file
    pub files_per_stats: usize,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("corpus"),
            limit: 1000,
            bitcode: PathBuf::from("bitcode"),
            stats: PathBuf::from("stats"),
            files_per_stats: 10,
        }
    }
}

/// Configuration for analyzing previously collected statistics directories.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Directory of `<knob>.txt` directory lists
    pub directories: PathBuf,
    /// Directory `<knob>_result.json` files are written to
    pub output: PathBuf,
    /// The curated statistic tables
    pub references: ReferencePaths,
    /// Log of statistics missing from the reference tables
    pub missing_log: PathBuf,
    /// Highest `n` of a `stats_<n>.txt` file that is read
    pub max_stats_index: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            directories: PathBuf::from("directories"),
            output: PathBuf::from("Batch5_Results"),
            references: ReferencePaths::default(),
            missing_log: PathBuf::from("missing_stats.txt"),
            max_stats_index: 10,
        }
    }
}

/// Configuration for recovering knob defaults from LLVM sources.
#[derive(Clone, Debug)]
pub struct DecodeConfig {
    /// Root of the LLVM checkout the locations are relative to
    pub llvm_root: PathBuf,
    /// `path:line:col name` lines, one per knob
    pub locations: PathBuf,
    /// Where the `identifier: value` table is written
    pub output: PathBuf,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            llvm_root: PathBuf::from("./../../dev/llvm-project"),
            locations: PathBuf::from("prelim_knobs.txt"),
            output: PathBuf::from("knobs_decoded.txt"),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Parses `identifier: value` lines. Lines without a `:` are skipped, later
/// duplicates win.
pub fn parse_key_values(text: &str) -> SaHashMap<String, String> {
    text.lines()
        .filter_map(|line| line.trim().split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Reads an `identifier: value` file.
pub fn read_key_value_file(path: &Path) -> Result<SaHashMap<String, String>> {
    Ok(parse_key_values(&read(path)?))
}

/// Non-blank lines of `text`, trimmed.
fn entries(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Reads a list of knob identifiers, one per line.
pub fn read_knob_list(path: &Path) -> Result<Vec<String>> {
    Ok(entries(&read(path)?).map(str::to_string).collect())
}

/// Reads a list of directories, one per line. Blank lines are skipped.
pub fn read_directory_list(path: &Path) -> Result<Vec<PathBuf>> {
    Ok(entries(&read(path)?).map(PathBuf::from).collect())
}

/// Resolves each name in `names` against the knob table, in order.
///
/// Every value is parsed here, so a knob that can't be swept stops the run
/// before any work is done.
pub fn resolve_knobs(table: &SaHashMap<String, String>, names: &[String]) -> Result<Vec<Knob>> {
    names
        .iter()
        .map(|name| match table.get(name) {
            Some(value) => Knob::parse(name, value),
            None => Err(Error::UnknownKnob(name.clone())),
        })
        .collect()
}

/// Loads the knobs named in `list` with their defaults from `table`.
pub fn load_knobs(table: &Path, list: &Path) -> Result<Vec<Knob>> {
    resolve_knobs(&read_key_value_file(table)?, &read_knob_list(list)?)
}
