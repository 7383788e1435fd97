//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The crate-wide error type.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Every failure that stops a study run.
///
/// Recoverable conditions (a value rejected by `opt`, an unclassified
/// statistic, a missing directory list) are not errors, they are reported
/// and logged where they happen.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A line in a config or reference file didn't have the expected shape.
    #[error("malformed line {line} in `{}`: '{text}'", path.display())]
    MalformedLine {
        /// The file being read
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// The offending line, trimmed
        text: String,
    },
    /// A knob's default value is neither an integer nor a float.
    #[error("invalid value: `{knob}` set to '{value}'")]
    InvalidKnobValue {
        /// The knob identifier
        knob: String,
        /// The raw value text
        value: String,
    },
    /// A knob was requested but has no entry in the decoded knob table.
    #[error("knob `{0}` has no entry in the decoded knob table")]
    UnknownKnob(String),
    /// A `cl::opt` declaration couldn't be found at the given location.
    #[error("unable to find `{function}` declaration in `{}` near line {line}", path.display())]
    UnresolvedKnob {
        /// Source file that was searched
        path: PathBuf,
        /// 1-based line the search started at
        line: usize,
        /// The declaration name that was expected
        function: String,
    },
    /// Reading, writing or spawning failed.
    #[error("i/o error on `{}`: {source}", path.display())]
    Io {
        /// The file or program involved
        path: PathBuf,
        /// The underlying error
        #[source]
        source: io::Error,
    },
    /// An external tool ran but exited unsuccessfully.
    #[error("`{}` exited with {status}: {stderr}", program.display())]
    ToolFailed {
        /// The program that was run
        program: PathBuf,
        /// Its exit status
        status: ExitStatus,
        /// Whatever it printed on stderr
        stderr: String,
    },
    /// A sweep job panicked before sending its records back.
    #[error("job for chunk {chunk} panicked: {message}")]
    WorkerPanic {
        /// Index of the chunk the job was processing
        chunk: usize,
        /// The panic payload, if it was a string
        message: String,
    },
    /// A result table couldn't be serialized.
    #[error("unable to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an [`io::Error`] with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Shorthand for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = Error::MalformedLine {
            path: PathBuf::from("stats_imp.txt"),
            line: 3,
            text: "no delimiters".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "malformed line 3 in `stats_imp.txt`: 'no delimiters'"
        );

        let err = Error::io("opt", io::Error::from(io::ErrorKind::NotFound));

        assert!(err.to_string().starts_with("i/o error on `opt`"));
    }
}
