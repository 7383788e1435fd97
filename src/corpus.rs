//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Layout of the normalized bitcode samples shared by collection and sweeps.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A directory of round-tripped samples named `test_<n>.bc`, numbered from 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Corpus {
    dir: PathBuf,
}

impl Corpus {
    /// A corpus rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the sample with 1-based index `index`.
    pub fn sample(&self, index: usize) -> PathBuf {
        self.dir.join(format!("test_{index}.bc"))
    }
}

/// Lists the `.bc` files directly inside `dir`, sorted by name so that
/// repeated collections number samples the same way.
pub fn list_bitcode(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::default();

    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();

        if path.is_file() && path.extension().map_or(false, |ext| ext == "bc") {
            files.push(path);
        }
    }

    files.sort();

    Ok(files)
}
