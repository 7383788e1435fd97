//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Offline analysis of statistics directories collected by earlier runs.
//!
//! Each knob has a directory list, `<knob>.txt`, naming one statistics
//! directory per swept value. The `stats_<k>.txt` files under each directory
//! are summed into a single record, so the list order becomes the value order
//! of the exported table.

use crate::aggregate::ResultTable;
use crate::config::{self, AnalysisConfig};
use crate::display;
use crate::error::{Error, Result};
use crate::export::{self, ExportPolicy};
use crate::logfile::AppendLog;
use crate::reference::ReferenceTables;
use crate::stats::{StatRecord, StatsParser};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// What analysis produced for one knob.
#[derive(Clone, Debug)]
pub struct KnobAnalysis {
    /// Name of the knob, taken from its directory list
    pub knob: String,
    /// The exported table, one column per listed directory
    pub table: ResultTable,
    /// Where the table was written
    pub path: PathBuf,
}

/// Whether `name` is `stats_<k>.txt` with `1 <= k <= max_index`.
pub fn is_stats_file(name: &str, max_index: usize) -> bool {
    name.strip_prefix("stats_")
        .and_then(|rest| rest.strip_suffix(".txt"))
        .filter(|k| !k.starts_with('0') && k.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|k| k.parse::<usize>().ok())
        .map_or(false, |k| (1..=max_index).contains(&k))
}

/// Sums every statistic in the stats files anywhere under `dir`.
///
/// Entries that can't be read are reported and skipped, so a directory that
/// doesn't exist simply yields an empty record.
pub fn collect_directory(dir: &Path, parser: &StatsParser, max_index: usize) -> StatRecord {
    let mut record = StatRecord::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                display::print_warning(&format!("skipping entry under {}: {err}", dir.display()));
                continue;
            }
        };

        let is_stats = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .map_or(false, |name| is_stats_file(name, max_index));

        if !is_stats {
            continue;
        }

        match fs::read_to_string(entry.path()) {
            Ok(text) => parser.accumulate_lines(&text, &mut record),
            Err(err) => display::print_warning(&format!(
                "unable to read {}: {err}",
                entry.path().display()
            )),
        }
    }

    record
}

/// Reads a knob's directory list. A list that can't be read is reported and
/// treated as empty.
pub fn directories_for(list: &Path) -> Vec<PathBuf> {
    match config::read_directory_list(list) {
        Ok(dirs) => dirs,
        Err(err) => {
            display::print_error(&err);
            Vec::default()
        }
    }
}

/// The `<knob>.txt` directory lists in `dir`, sorted by name.
pub fn directory_lists(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut lists = Vec::default();

    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();

        if !path.is_file() || path.extension().map_or(true, |ext| ext != "txt") {
            continue;
        }

        if let Some(knob) = path.file_stem().and_then(|stem| stem.to_str()) {
            lists.push((knob.to_string(), path.clone()));
        }
    }

    lists.sort();

    Ok(lists)
}

/// Builds the table for one knob from its list of statistics directories.
pub fn analyze_knob(
    directories: &[PathBuf],
    parser: &StatsParser,
    max_index: usize,
) -> ResultTable {
    let records: Vec<_> = directories
        .iter()
        .map(|dir| {
            let record = collect_directory(dir, parser, max_index);

            display::print_directory_collected(dir);
            record
        })
        .collect();

    ResultTable::tabulate(&records).without_constant()
}

/// Analyzes every directory list in `config.directories`.
pub fn run_analysis(config: &AnalysisConfig) -> Result<Vec<KnobAnalysis>> {
    let start = Instant::now();
    let parser = StatsParser::new();
    let references = ReferenceTables::load(&config.references)?;
    let missing = AppendLog::new(&config.missing_log);
    let mut results = Vec::default();

    for (knob, list) in directory_lists(&config.directories)? {
        let table = analyze_knob(&directories_for(&list), &parser, config.max_stats_index);
        let selection = export::select(table, &references, ExportPolicy::ImportantOnly);

        export::report_unknown(&knob, &selection.unknown, &missing)?;

        let name = export::file_name_for(&knob, "_result.json");
        let path = export::write_json(&selection.table, &config.output, &name)?;

        display::print_knob_finished(&knob, selection.table.len(), &path);

        results.push(KnobAnalysis {
            knob,
            table: selection.table,
            path,
        });
    }

    display::print_summary("knobs", results.len(), start.elapsed());

    Ok(results)
}
