//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Shared append-only log files.

use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An append-only diagnostic file (`invalid_knobs.txt`, `missing_stats.txt`)
/// that can be shared between worker threads.
///
/// The file is only opened when something is written, so a clean run leaves
/// no file behind.
#[derive(Debug)]
pub struct AppendLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AppendLog {
    /// Creates a log that appends to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The file being appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `text` verbatim. Writes from different threads never
    /// interleave.
    pub fn append(&self, text: &str) -> Result<()> {
        // a poisoned lock only means another writer panicked mid-append
        let _guard = self.lock.lock().unwrap_or_else(|poison| poison.into_inner());

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(text.as_bytes()))
            .map_err(|e| Error::io(&self.path, e))
    }

    /// Appends `line` followed by a newline.
    pub fn append_line(&self, line: &str) -> Result<()> {
        self.append(&format!("{line}\n"))
    }
}
