//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Recovers knob identifiers and their defaults from `cl::opt` declarations
//! in an LLVM checkout.
//!
//! Input is one location per line, `path:line:col name`, where `name` is the
//! C++ variable the option is declared as:
//!
//! ```none
//! llvm/lib/Transforms/Scalar/LICM.cpp:104:3 MaxNumUsesTraversed
//! ```
//!
//! The declaration starting near that line is expected to look like
//! `cl::opt<T> name("identifier", ..., cl::init(value), ...)`, possibly spread
//! over several lines.

use crate::config::DecodeConfig;
use crate::display;
use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

// 1-based lines `line..=line + LOOKAHEAD + 1` are read around a declaration
const LOOKAHEAD: usize = 10;

/// Where a `cl::opt` is declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnobLocation {
    /// Source file, relative to the LLVM root
    pub file: PathBuf,
    /// 1-based line of the declaration
    pub line: usize,
    /// The C++ variable name of the option
    pub function: String,
}

/// An option identifier and the literal text of its `cl::init`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// The `-identifier` the option is set with
    pub identifier: String,
    /// The `cl::init(...)` argument, verbatim
    pub value: String,
}

/// Parses location lines. Blank lines are skipped, anything else that isn't
/// a location is fatal.
pub fn parse_locations(path: &Path, text: &str) -> Result<Vec<KnobLocation>> {
    let pattern = Regex::new(r"^(.+?):(\d+):(\d+)\s+(\w+)").expect("invalid location pattern");
    let mut locations = Vec::default();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        let malformed = || Error::MalformedLine {
            path: path.to_path_buf(),
            line: idx + 1,
            text: line.to_string(),
        };

        let captures = pattern.captures(line).ok_or_else(malformed)?;

        locations.push(KnobLocation {
            file: PathBuf::from(&captures[1]),
            line: captures[2].parse().map_err(|_| malformed())?,
            function: captures[4].to_string(),
        });
    }

    Ok(locations)
}

/// Joins the trimmed source lines from `line` (1-based) through the 11 lines
/// after it, then breaks the result after every `;` so that a match can't
/// run into the next declaration.
pub fn snippet_around(source: &str, line: usize) -> String {
    let first = line.saturating_sub(1);

    source
        .lines()
        .skip(first)
        .take(line + LOOKAHEAD - first + 1)
        .map(str::trim)
        .collect::<String>()
        .replace(';', ";\n")
}

/// Finds the declaration of `function` in `snippet`.
pub fn extract_declaration(snippet: &str, function: &str) -> Option<Declaration> {
    let pattern = format!(
        r#"(?s){}\s*\(\s*"([^"]+)"(?:.*?)cl::init\s*\(\s*([^)]+)\s*\)"#,
        regex::escape(function)
    );
    let captures = Regex::new(&pattern).ok()?.captures(snippet)?;

    Some(Declaration {
        identifier: captures[1].to_string(),
        value: captures[2].trim().to_string(),
    })
}

/// Reads the source `location` points into and extracts its declaration.
pub fn resolve(llvm_root: &Path, location: &KnobLocation) -> Result<Declaration> {
    let path = llvm_root.join(&location.file);
    let source = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;

    extract_declaration(&snippet_around(&source, location.line), &location.function).ok_or_else(|| {
        Error::UnresolvedKnob {
            path,
            line: location.line,
            function: location.function.clone(),
        }
    })
}

/// Renders the `identifier: value` table. An identifier declared twice keeps
/// its first position and its last value.
pub fn render_table(declarations: &[Declaration]) -> String {
    let mut rows: Vec<(&str, &str)> = Vec::default();

    for decl in declarations {
        match rows.iter_mut().find(|(id, _)| *id == decl.identifier) {
            Some(row) => row.1 = decl.value.as_str(),
            None => rows.push((decl.identifier.as_str(), decl.value.as_str())),
        }
    }

    rows.iter().map(|(id, value)| format!("{id}: {value}\n")).collect()
}

/// Resolves every location in `config.locations` and writes the table to
/// `config.output`. Returns the declarations in input order.
pub fn decode_knobs(config: &DecodeConfig) -> Result<Vec<Declaration>> {
    let start = Instant::now();
    let text = fs::read_to_string(&config.locations).map_err(|e| Error::io(&config.locations, e))?;
    let mut declarations = Vec::default();

    for location in parse_locations(&config.locations, &text)? {
        let decl = resolve(&config.llvm_root, &location)?;

        display::print_knob_decoded(&decl.identifier, &decl.value);
        declarations.push(decl);
    }

    fs::write(&config.output, render_table(&declarations))
        .map_err(|e| Error::io(&config.output, e))?;

    display::print_summary("knobs", declarations.len(), start.elapsed());

    Ok(declarations)
}
