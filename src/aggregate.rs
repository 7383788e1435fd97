//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Merging of per-chunk records into one table per knob.

use crate::stats::{Stat, StatRecord, COMPILE_TIME};
use serde::Serialize;
use std::collections::BTreeMap;

/// Sums a worker's records into the running totals, index by index.
///
/// Index `i` of both lists belongs to candidate value `i`, so the order in
/// which workers finish doesn't matter.
pub fn merge_into(totals: &mut Vec<StatRecord>, partial: Vec<StatRecord>) {
    if totals.len() < partial.len() {
        totals.resize_with(partial.len(), StatRecord::new);
    }

    for (total, record) in totals.iter_mut().zip(partial) {
        total.merge(record);
    }
}

/// Merges every worker's records into `width` totals.
pub fn merge_all(
    width: usize,
    partials: impl IntoIterator<Item = Vec<StatRecord>>,
) -> Vec<StatRecord> {
    let mut totals = vec![StatRecord::new(); width];

    for partial in partials {
        merge_into(&mut totals, partial);
    }

    totals
}

/// Whether every entry of `series` is the same value.
pub fn is_constant(series: &[Stat]) -> bool {
    series.windows(2).all(|pair| pair[0] == pair[1])
}

/// One series per statistic, index-aligned with the values that were swept.
///
/// Every series has exactly [`ResultTable::width`] entries, statistics that
/// didn't show up for some value are zero there. Keys are kept sorted so that
/// exported files are stable between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    series: BTreeMap<String, Vec<Stat>>,
    #[serde(skip)]
    width: usize,
}

impl ResultTable {
    /// Creates an empty table for `width` values.
    pub fn new(width: usize) -> Self {
        Self {
            series: BTreeMap::new(),
            width,
        }
    }

    /// Lays out `records` (one per swept value) as a table.
    pub fn tabulate(records: &[StatRecord]) -> Self {
        let mut table = Self::new(records.len());

        for (idx, record) in records.iter().enumerate() {
            for (key, value) in record.iter() {
                table.series_mut(key)[idx] += value;
            }
        }

        table
    }

    fn series_mut(&mut self, key: &str) -> &mut Vec<Stat> {
        let width = self.width;

        self.series
            .entry(key.to_string())
            .or_insert_with(|| vec![Stat::ZERO; width])
    }

    /// How many values each series has.
    pub fn width(&self) -> usize {
        self.width
    }

    /// How many statistics are in the table.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the table has no statistics.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The series for `key`.
    pub fn get(&self, key: &str) -> Option<&[Stat]> {
        self.series.get(key).map(Vec::as_slice)
    }

    /// Whether `key` has a series.
    pub fn contains(&self, key: &str) -> bool {
        self.series.contains_key(key)
    }

    /// Iterates over the statistics in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Stat])> + '_ {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Keeps only the series `keep` returns `true` for.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &[Stat]) -> bool) {
        self.series.retain(|key, series| keep(key, series));
    }

    /// Drops every series that has the same value for every swept value.
    pub fn without_constant(&self) -> Self {
        let mut table = self.clone();

        table.retain(|_, series| !is_constant(series));
        table
    }

    /// Like [`ResultTable::without_constant`], but compile time is always
    /// kept when it was measured at all.
    pub fn discriminative(&self) -> Self {
        let mut table = self.without_constant();

        if let Some(time) = self.series.get(COMPILE_TIME) {
            table
                .series
                .entry(COMPILE_TIME.to_string())
                .or_insert_with(|| time.clone());
        }

        table
    }
}
