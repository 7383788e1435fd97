//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Final filtering of result tables and the JSON files they end up in.

use crate::aggregate::ResultTable;
use crate::display;
use crate::error::{Error, Result};
use crate::logfile::AppendLog;
use crate::reference::{Category, ReferenceTables};
use crate::stats::COMPILE_TIME;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Which classified statistics make it into an exported table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExportPolicy {
    /// Used by knob sweeps: everything except ignored statistics.
    DropIgnored,
    /// Used when analyzing collected directories: important statistics and
    /// anything unclassified.
    ImportantOnly,
}

/// A table ready to be written, and the statistics no reference table knew.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    /// The statistics that survived
    pub table: ResultTable,
    /// Keys that are on none of the reference tables. These are still in
    /// `table`.
    pub unknown: Vec<String>,
}

/// Applies `policy` to `table`.
///
/// Unclassified statistics are always kept, compile time is never reported
/// as unclassified.
pub fn select(
    mut table: ResultTable,
    references: &ReferenceTables,
    policy: ExportPolicy,
) -> Selection {
    let mut unknown = Vec::default();

    table.retain(|key, _| {
        if key == COMPILE_TIME {
            return true;
        }

        let category = match references.classify(key) {
            Some(category) => category,
            None => {
                unknown.push(key.to_string());
                return true;
            }
        };

        match policy {
            ExportPolicy::DropIgnored => !references.is_ignored(key),
            ExportPolicy::ImportantOnly => matches!(category, Category::Important { .. }),
        }
    });

    Selection { table, unknown }
}

/// Reports unclassified statistics for `knob` on the console and appends
/// them to the missing-stats log. Nothing is written if there are none.
pub fn report_unknown(knob: &str, unknown: &[String], log: &AppendLog) -> Result<()> {
    if unknown.is_empty() {
        return Ok(());
    }

    let mut entry = format!("Missing stats for knob {knob}:\n");

    for key in unknown {
        display::print_unknown_stat(key);
        entry += key;
        entry.push('\n');
    }

    log.append(&entry)
}

/// The file name used for a knob's results. Path separators are replaced so
/// the file always lands inside the output directory.
pub fn file_name_for(knob: &str, suffix: &str) -> String {
    let stem: String = knob
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    format!("{stem}{suffix}")
}

/// Serializes `table` as a JSON object into `dir/name`, creating `dir` if
/// needed. Returns the path written.
pub fn write_json(table: &ResultTable, dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let path = dir.join(name);
    let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, table)?;
    writer.flush().map_err(|e| Error::io(&path, e))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Stat, StatRecord};

    fn references() -> ReferenceTables {
        ReferenceTables::parse(
            (Path::new("imp"), "important#p#More is Better\n"),
            (Path::new("amb"), "ambiguous#p\n"),
            (Path::new("ign"), "ignored#p\n"),
        )
        .unwrap()
    }

    fn table() -> ResultTable {
        let keys = ["important (p)", "ambiguous (p)", "ignored (p)", "mystery (p)"];
        let mut records: Vec<StatRecord> = (1..=2)
            .map(|n| keys.iter().map(|&k| (k, Stat::Count(n))).collect())
            .collect();

        records[0].add(COMPILE_TIME, Stat::Seconds(0.25));

        ResultTable::tabulate(&records)
    }

    fn keys(table: &ResultTable) -> Vec<&str> {
        table.iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn sweep_policy_drops_only_ignored() {
        let selection = select(table(), &references(), ExportPolicy::DropIgnored);

        assert_eq!(
            keys(&selection.table),
            ["ambiguous (p)", COMPILE_TIME, "important (p)", "mystery (p)"]
        );
        assert_eq!(selection.unknown, ["mystery (p)"]);
    }

    #[test]
    fn analysis_policy_keeps_important_and_unknown() {
        let selection = select(table(), &references(), ExportPolicy::ImportantOnly);

        assert_eq!(
            keys(&selection.table),
            [COMPILE_TIME, "important (p)", "mystery (p)"]
        );
        assert_eq!(selection.unknown, ["mystery (p)"]);
    }

    #[test]
    fn keys_on_several_tables() {
        let references = ReferenceTables::parse(
            (Path::new("imp"), "both#p#Less is Better\n"),
            (Path::new("amb"), ""),
            (Path::new("ign"), "both#p\n"),
        )
        .unwrap();
        let records: Vec<StatRecord> = vec![[("both (p)", Stat::Count(1))].into_iter().collect()];

        let sweep = select(
            ResultTable::tabulate(&records),
            &references,
            ExportPolicy::DropIgnored,
        );

        assert!(keys(&sweep.table).is_empty());
        assert!(sweep.unknown.is_empty());

        let analysis = select(
            ResultTable::tabulate(&records),
            &references,
            ExportPolicy::ImportantOnly,
        );

        assert_eq!(keys(&analysis.table), ["both (p)"]);
        assert!(analysis.unknown.is_empty());
    }

    #[test]
    fn unknown_stats_are_logged_per_knob() {
        let dir = tempfile::tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("missing_stats.txt"));

        report_unknown("inline-threshold", &[], &log).unwrap();
        assert!(!log.path().exists());

        report_unknown("inline-threshold", &["mystery (p)".to_string()], &log).unwrap();

        assert_eq!(
            fs::read_to_string(log.path()).unwrap(),
            "Missing stats for knob inline-threshold:\nmystery (p)\n"
        );
    }

    #[test]
    fn json_lands_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let records: Vec<StatRecord> = vec![
            [("insts (pass1)", Stat::Count(20))].into_iter().collect(),
            [("insts (pass1)", Stat::Count(10))].into_iter().collect(),
        ];
        let table = ResultTable::tabulate(&records);

        let path = write_json(&table, &out, &file_name_for("licm-max", ".json")).unwrap();

        assert_eq!(path, out.join("licm-max.json"));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            r#"{"insts (pass1)":[20,10]}"#
        );
    }

    #[test]
    fn file_names_stay_in_directory() {
        assert_eq!(file_name_for("a/b", "_result.json"), "a_b_result.json");
    }
}
