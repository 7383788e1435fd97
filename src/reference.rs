//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Curated tables classifying which statistics matter.
//!
//! Each table is a text file of `description#component[#category]` lines.
//! Only the important table uses the third column, where `More is Better`
//! marks statistics that improve as they grow.

use crate::error::{Error, Result};
use crate::stats::{stat_key, SaHashMap, SaHashSet};
use std::fs;
use std::path::{Path, PathBuf};

const MORE_IS_BETTER: &str = "More is Better";

/// Where the three reference tables live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferencePaths {
    /// Statistics worth plotting
    pub important: PathBuf,
    /// Statistics whose direction is unclear
    pub ambiguous: PathBuf,
    /// Statistics that carry no signal
    pub ignored: PathBuf,
}

impl Default for ReferencePaths {
    fn default() -> Self {
        Self {
            important: PathBuf::from("stats_imp.txt"),
            ambiguous: PathBuf::from("stats_amb.txt"),
            ignored: PathBuf::from("stats_ignore.txt"),
        }
    }
}

/// The class a statistic belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Category {
    /// Worth plotting. `more_is_better` gives the preferred direction.
    Important {
        /// Whether larger values are an improvement
        more_is_better: bool,
    },
    /// Known, but without a clear preferred direction.
    Ambiguous,
    /// Known to carry no signal.
    Ignored,
}

/// All three tables, keyed the same way statistic records are.
#[derive(Clone, Debug, Default)]
pub struct ReferenceTables {
    important: SaHashMap<String, bool>,
    ambiguous: SaHashSet<String>,
    ignored: SaHashSet<String>,
}

struct Row {
    key: String,
    category: Option<String>,
}

fn parse_rows(path: &Path, text: &str, columns: usize) -> Result<Vec<Row>> {
    let mut rows = Vec::default();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.trim().split('#').collect();

        if parts.len() < columns {
            return Err(Error::MalformedLine {
                path: path.to_path_buf(),
                line: idx + 1,
                text: line.trim().to_string(),
            });
        }

        rows.push(Row {
            key: stat_key(parts[0], parts[1]),
            category: parts.get(2).map(|c| c.trim().to_string()),
        });
    }

    Ok(rows)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

impl ReferenceTables {
    /// Loads every table. Any malformed line is fatal.
    pub fn load(paths: &ReferencePaths) -> Result<Self> {
        let important = read(&paths.important)?;
        let ambiguous = read(&paths.ambiguous)?;
        let ignored = read(&paths.ignored)?;

        Self::parse(
            (paths.important.as_path(), important.as_str()),
            (paths.ambiguous.as_path(), ambiguous.as_str()),
            (paths.ignored.as_path(), ignored.as_str()),
        )
    }

    /// Parses already-read tables. Each pair is the path (for errors) and
    /// the file contents.
    pub fn parse(
        important: (&Path, &str),
        ambiguous: (&Path, &str),
        ignored: (&Path, &str),
    ) -> Result<Self> {
        let mut tables = Self::default();

        for row in parse_rows(important.0, important.1, 3)? {
            let more_is_better = row.category.as_deref() == Some(MORE_IS_BETTER);

            tables.important.insert(row.key, more_is_better);
        }

        for row in parse_rows(ambiguous.0, ambiguous.1, 2)? {
            tables.ambiguous.insert(row.key);
        }

        for row in parse_rows(ignored.0, ignored.1, 2)? {
            tables.ignored.insert(row.key);
        }

        Ok(tables)
    }

    /// Whether `key` is on the ambiguous table.
    pub fn is_ambiguous(&self, key: &str) -> bool {
        self.ambiguous.contains(key)
    }

    /// Whether `key` is on the ignore table.
    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignored.contains(key)
    }

    /// The category of `key`, if it is classified. A key on several tables
    /// reports the first of important, ambiguous, ignored.
    pub fn classify(&self, key: &str) -> Option<Category> {
        if let Some(&more_is_better) = self.important.get(key) {
            return Some(Category::Important { more_is_better });
        }

        if self.is_ambiguous(key) {
            return Some(Category::Ambiguous);
        }

        self.is_ignored(key).then_some(Category::Ignored)
    }
}
