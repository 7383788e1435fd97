//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Process contracts for the LLVM tools the study drives.
//!
//! The tools are opaque executables: bitcode and IR travel over pipes, and
//! everything interesting `opt` has to say (statistics, `perf` timing,
//! rejected flag values) comes back on stderr.

use crate::error::{Error, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;

/// The optimization pipelines every sample is measured under.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OptLevel {
    /// `-O1`
    O1,
    /// `-O2`
    O2,
    /// `-O3`
    O3,
    /// `-Os`
    Os,
    /// `-Oz`
    Oz,
}

impl OptLevel {
    /// Every level, in the order they are run.
    pub const ALL: [OptLevel; 5] = [
        OptLevel::O1,
        OptLevel::O2,
        OptLevel::O3,
        OptLevel::Os,
        OptLevel::Oz,
    ];

    /// The name of the level, e.g. `O2`.
    pub fn name(self) -> &'static str {
        match self {
            Self::O1 => "O1",
            Self::O2 => "O2",
            Self::O3 => "O3",
            Self::Os => "Os",
            Self::Oz => "Oz",
        }
    }

    /// The flag `opt` takes for the level, e.g. `-O2`.
    pub fn flag(self) -> &'static str {
        match self {
            Self::O1 => "-O1",
            Self::O2 => "-O2",
            Self::O3 => "-O3",
            Self::Os => "-Os",
            Self::Oz => "-Oz",
        }
    }
}

/// Something that can run `opt -stats` over a bitcode file.
///
/// Workers only ever see this trait, which keeps the sweep logic independent
/// of how (or whether) a real toolchain is installed.
pub trait Optimizer: Send + Sync {
    /// Runs the optimizer over `input` with an optional pipeline and knob
    /// override (`-<knob>=<value>`), returning everything it printed on
    /// stderr.
    ///
    /// Only failing to run the tool at all is an error; a non-zero exit is
    /// reported through the returned text like any other diagnostic.
    fn optimize(&self, input: &Path, level: Option<OptLevel>, knob: Option<&str>)
        -> Result<String>;
}

/// Something that can normalize a raw bitcode sample.
pub trait RoundTrip {
    /// Rewrites `bitcode` into a canonical bitcode file at `output`.
    fn round_trip(&self, bitcode: &[u8], output: &Path) -> Result<()>;
}

/// Locations of the LLVM tools and the profiler `opt` runs under.
#[derive(Clone, Debug)]
pub struct Toolchain {
    /// Path to `opt`
    pub opt: PathBuf,
    /// Path to `llvm-dis`
    pub llvm_dis: PathBuf,
    /// Path to `llvm-as`
    pub llvm_as: PathBuf,
    /// Command `opt` is wrapped in, e.g. `perf stat`. Empty runs `opt`
    /// directly and no timing is collected.
    pub profiler: Vec<String>,
}

impl Toolchain {
    /// The tools inside an LLVM build's `bin/` directory, profiled with
    /// `perf stat`.
    pub fn from_bin_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();

        Self {
            opt: dir.join("opt"),
            llvm_dis: dir.join("llvm-dis"),
            llvm_as: dir.join("llvm-as"),
            profiler: vec!["perf".to_string(), "stat".to_string()],
        }
    }

    /// Replaces the profiler prefix.
    pub fn with_profiler(mut self, profiler: Vec<String>) -> Self {
        self.profiler = profiler;
        self
    }

    /// Disassembles bitcode into textual IR.
    pub fn disassemble(&self, bitcode: &[u8]) -> Result<String> {
        let mut command = Command::new(&self.llvm_dis);
        command.arg("-");

        let output = checked(pipe_through(command, &self.llvm_dis, bitcode)?, &self.llvm_dis)?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Assembles textual IR into a bitcode file at `output`.
    pub fn assemble(&self, ir: &str, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.llvm_as);
        command.arg("-").arg("-o").arg(output);

        checked(
            pipe_through(command, &self.llvm_as, ir.as_bytes())?,
            &self.llvm_as,
        )?;

        Ok(())
    }
}

impl RoundTrip for Toolchain {
    // llvm-dis | llvm-as, which drops anything the assembler wouldn't emit
    fn round_trip(&self, bitcode: &[u8], output: &Path) -> Result<()> {
        let ir = self.disassemble(bitcode)?;

        self.assemble(&ir, output)
    }
}

impl Optimizer for Toolchain {
    fn optimize(
        &self,
        input: &Path,
        level: Option<OptLevel>,
        knob: Option<&str>,
    ) -> Result<String> {
        let (mut command, program) = match self.profiler.split_first() {
            Some((profiler, args)) => {
                let mut command = Command::new(profiler);
                command.args(args).arg(&self.opt);

                (command, PathBuf::from(profiler))
            }
            None => (Command::new(&self.opt), self.opt.clone()),
        };

        if let Some(flag) = knob {
            command.arg(flag);
        }

        if let Some(level) = level {
            command.arg(level.flag());
        }

        // stdout is the optimized module, nobody wants it
        let output = command
            .arg("-stats")
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::io(&program, e))?;

        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }
}

fn checked(output: Output, program: &Path) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }

    Err(Error::ToolFailed {
        program: program.to_path_buf(),
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

// feeds `input` on a separate thread so that a tool filling its stdout pipe
// can't deadlock against us filling its stdin
fn pipe_through(mut command: Command, program: &Path, input: &[u8]) -> Result<Output> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::io(program, e))?;

    let stdin = child.stdin.take();

    thread::scope(|s| {
        let writer = s.spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(input),
            None => Ok(()),
        });

        let output = child.wait_with_output().map_err(|e| Error::io(program, e))?;

        match writer.join() {
            // the tool exiting early is reported through its exit status
            Ok(Err(e)) if e.kind() != ErrorKind::BrokenPipe => Err(Error::io(program, e)),
            _ => Ok(output),
        }
    })
}
