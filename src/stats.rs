//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Statistic records and the parser for `opt -stats` / `perf stat` output.

use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ops::AddAssign;

/// Alias for `std::collections::HashMap<K, V, ahash::RandomState>`. Records
/// are hit once per output line, so the faster hash is worth it.
pub type SaHashMap<K, V> = HashMap<K, V, ahash::RandomState>;

/// Alias for `std::collections::HashSet<V, ahash::RandomState>`.
pub type SaHashSet<V> = HashSet<V, ahash::RandomState>;

/// The reserved key that accumulated `perf` wall-clock time is stored under.
pub const COMPILE_TIME: &str = "compile-time (seconds)";

/// Banner LLVM prints above the `-stats` counters.
const STATS_BANNER: &str = "Statistics Collected";

/// Banner `perf stat` prints above its counters.
const PERF_BANNER: &str = "Performance counter stats";

/// Substring `opt` emits when a `cl::opt` rejects the value it was given.
const INVALID_VALUE: &str = "value invalid for";

/// Builds the `"<description> (<component>)"` key a statistic is stored under.
pub fn stat_key(description: &str, component: &str) -> String {
    format!("{} ({})", description.trim(), component.trim())
}

/// A single accumulated statistic.
///
/// Pass counters stay integral so they serialize as JSON integers, timing is
/// kept fractional.
#[derive(Copy, Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Stat {
    /// A counter from `-stats`
    Count(i64),
    /// Accumulated seconds from `perf stat`
    Seconds(f64),
}

impl Stat {
    /// The padding value for a statistic that never showed up.
    pub const ZERO: Stat = Stat::Count(0);

    /// The value as a float.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Count(n) => n as f64,
            Self::Seconds(s) => s,
        }
    }
}

impl AddAssign for Stat {
    fn add_assign(&mut self, rhs: Self) {
        *self = match (*self, rhs) {
            (Self::Count(a), Self::Count(b)) => Self::Count(a.saturating_add(b)),
            (a, b) => Self::Seconds(a.as_f64() + b.as_f64()),
        };
    }
}

impl PartialEq for Stat {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Count(a), Self::Count(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

/// Statistic totals for a single knob value, summed over every file and
/// optimization level it was run with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatRecord {
    stats: SaHashMap<String, Stat>,
}

impl StatRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the running total for `key`.
    pub fn add(&mut self, key: &str, value: Stat) {
        match self.stats.get_mut(key) {
            Some(total) => *total += value,
            None => {
                self.stats.insert(key.to_string(), value);
            }
        }
    }

    /// Sums every statistic of `other` into `self`.
    pub fn merge(&mut self, other: StatRecord) {
        for (key, value) in other.stats {
            *self.stats.entry(key).or_insert(Stat::ZERO) += value;
        }
    }

    /// Gets the total for `key`, if it was ever recorded.
    pub fn get(&self, key: &str) -> Option<Stat> {
        self.stats.get(key).copied()
    }

    /// Iterates over every `(key, total)` pair in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Stat)> + '_ {
        self.stats.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The number of distinct statistics.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Stat)> for StatRecord {
    fn from_iter<T: IntoIterator<Item = (K, Stat)>>(iter: T) -> Self {
        let mut record = Self::new();

        for (key, value) in iter {
            record.add(&key.into(), value);
        }

        record
    }
}

/// Returns the part of `output` holding `-stats` counters: everything after
/// the `Statistics Collected` banner, up to the `perf stat` report if there
/// is one. Empty if `opt` didn't print any statistics.
pub fn statistics_section(output: &str) -> &str {
    let start = match output.find(STATS_BANNER) {
        Some(idx) => idx,
        None => return "",
    };

    // skip the rest of the banner line
    let rest = &output[start..];
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => return "",
    };

    match rest.find(PERF_BANNER) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Whether `opt` rejected the knob value it was given.
pub fn rejected_value(output: &str) -> bool {
    output.contains(INVALID_VALUE)
}

/// Extracts statistics and timing from tool output.
///
/// Holds the compiled patterns so that they are built once per run and shared
/// between workers.
#[derive(Clone, Debug)]
pub struct StatsParser {
    line: Regex,
    elapsed: Regex,
}

impl StatsParser {
    /// Compiles the statistic line and `perf` timing patterns.
    pub fn new() -> Self {
        Self {
            line: Regex::new(r"^\s*(\d+)\s+(\S+)\s+-\s+(.*)$").expect("invalid stat pattern"),
            elapsed: Regex::new(r"\s+(\d+\.\d+) seconds time elapsed")
                .expect("invalid timing pattern"),
        }
    }

    /// Parses a `<count> <component> - <description>` line into its key and
    /// count.
    pub fn parse_line(&self, line: &str) -> Option<(String, i64)> {
        let captures = self.line.captures(line)?;
        let count = captures[1].parse::<i64>().ok()?;

        Some((stat_key(&captures[3], &captures[2]), count))
    }

    /// Adds every statistic line found in `text` to `record`. Lines that
    /// aren't statistics are skipped.
    pub fn accumulate_lines(&self, text: &str, record: &mut StatRecord) {
        for (key, count) in text.lines().filter_map(|line| self.parse_line(line)) {
            record.add(&key, Stat::Count(count));
        }
    }

    /// Extracts the wall-clock time reported by `perf stat`.
    pub fn elapsed_seconds(&self, output: &str) -> Option<f64> {
        self.elapsed
            .captures(output)
            .and_then(|captures| captures[1].parse::<f64>().ok())
    }

    /// Adds the statistics section and `perf` timing of one `opt` run to
    /// `record`.
    pub fn accumulate_output(&self, output: &str, record: &mut StatRecord) {
        self.accumulate_lines(statistics_section(output), record);

        if let Some(seconds) = self.elapsed_seconds(output) {
            record.add(COMPILE_TIME, Stat::Seconds(seconds));
        }
    }
}

impl Default for StatsParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_ser_tokens, Token};

    const OPT_OUTPUT: &str = "\
===-------------------------------------------------------------------------===
                          ... Statistics Collected ...
===-------------------------------------------------------------------------===

   3 inline           - Number of functions inlined
  12 instcombine      - Number of insts combined
   1 simplifycfg      - Number of blocks simplified

 Performance counter stats for './build/bin/opt -O2 -stats test_1.bc':

             15.23 msec task-clock                       #    0.958 CPUs utilized
                 2      context-switches                 #  131.339 /sec

       0.015897731 seconds time elapsed

       0.011986000 seconds user
";

    #[test]
    fn section_stops_at_perf_report() {
        let section = statistics_section(OPT_OUTPUT);

        assert!(section.contains("Number of insts combined"));
        assert!(!section.contains("Statistics Collected"));
        assert!(!section.contains("task-clock"));
    }

    #[test]
    fn section_is_empty_without_stats() {
        assert_eq!(statistics_section("warning: nothing to do\n"), "");
    }

    #[test]
    fn parse_full_output() {
        let parser = StatsParser::new();
        let mut record = StatRecord::new();

        parser.accumulate_output(OPT_OUTPUT, &mut record);

        assert_eq!(record.len(), 4);
        assert_eq!(
            record.get("Number of insts combined (instcombine)"),
            Some(Stat::Count(12))
        );
        assert_eq!(
            record.get("Number of functions inlined (inline)"),
            Some(Stat::Count(3))
        );
        assert_eq!(record.get(COMPILE_TIME), Some(Stat::Seconds(0.015897731)));
    }

    #[test]
    fn accumulation_sums() {
        let parser = StatsParser::new();
        let mut record = StatRecord::new();

        parser.accumulate_output(OPT_OUTPUT, &mut record);
        parser.accumulate_output(OPT_OUTPUT, &mut record);

        assert_eq!(
            record.get("Number of insts combined (instcombine)"),
            Some(Stat::Count(24))
        );
        assert_eq!(record.get(COMPILE_TIME), Some(Stat::Seconds(2.0 * 0.015897731)));
    }

    #[test]
    fn non_stat_lines_are_ignored() {
        let parser = StatsParser::new();

        assert_eq!(parser.parse_line("O1 STATS> "), None);
        assert_eq!(parser.parse_line("  2 context-switches  #  131 /sec"), None);
        assert_eq!(
            parser.parse_line("  7 licm - Number of instructions hoisted out of loop"),
            Some((
                "Number of instructions hoisted out of loop (licm)".to_string(),
                7
            ))
        );
    }

    #[test]
    fn merge_adds_per_key() {
        let mut a: StatRecord = [("A (X)", Stat::Count(5))].into_iter().collect();
        let b: StatRecord = [("A (X)", Stat::Count(3)), ("B (Y)", Stat::Count(1))]
            .into_iter()
            .collect();

        a.merge(b);

        assert_eq!(a.get("A (X)"), Some(Stat::Count(8)));
        assert_eq!(a.get("B (Y)"), Some(Stat::Count(1)));
    }

    #[test]
    fn invalid_value_detection() {
        assert!(rejected_value(
            "opt: for the --foo option: 'abc' value invalid for uint argument!"
        ));
        assert!(!rejected_value(OPT_OUTPUT));
    }

    #[test]
    fn stats_serialize_untagged() {
        assert_ser_tokens(&Stat::Count(8), &[Token::I64(8)]);
        assert_ser_tokens(&Stat::Seconds(0.5), &[Token::F64(0.5)]);
    }

    #[test]
    fn zero_matches_zero_seconds() {
        assert_eq!(Stat::ZERO, Stat::Seconds(0.0));
        assert_ne!(Stat::Count(1), Stat::Count(2));
    }
}
