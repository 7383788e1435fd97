//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Building the numbered sample corpus and its baseline statistics.

use crate::config::CollectConfig;
use crate::corpus::{self, Corpus};
use crate::display;
use crate::error::{Error, Result};
use crate::logfile::AppendLog;
use crate::stats;
use crate::toolchain::{OptLevel, Optimizer, RoundTrip};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Which `stats_<k>.txt` the statistics of sample `sample` go to.
pub fn stats_file_index(sample: usize, files_per_stats: usize) -> usize {
    (sample.max(1) - 1) / files_per_stats.max(1) + 1
}

/// Path of the `stats_<k>.txt` file for sample `sample`.
pub fn stats_file_for(dir: &Path, sample: usize, files_per_stats: usize) -> PathBuf {
    dir.join(format!(
        "stats_{}.txt",
        stats_file_index(sample, files_per_stats)
    ))
}

/// Runs `opt -stats` over one sample without a pipeline and then at every
/// level, returning the block written to the stats file for it.
pub fn stats_block<O: Optimizer + ?Sized>(
    optimizer: &O,
    sample: &Path,
    index: usize,
) -> Result<String> {
    let mut block = format!(
        "====================================  STATS FOR FILE : {index} ====================================\n"
    );

    let levels = std::iter::once(None).chain(OptLevel::ALL.into_iter().map(Some));

    for level in levels {
        let output = optimizer.optimize(sample, level, None)?;

        block += level.map_or("PLAIN", OptLevel::name);
        block += " STATS> \n";
        block += stats::statistics_section(&output);
    }

    Ok(block)
}

/// Round-trips up to `config.limit` bitcode files from `config.source` into
/// `config.bitcode` as `test_1.bc`, `test_2.bc`, ..., and appends their
/// statistics to `config.stats`. Returns how many samples were collected.
///
/// Files the tools refuse to round-trip are skipped with a warning and don't
/// use up a sample number.
pub fn collect_corpus<T: Optimizer + RoundTrip>(config: &CollectConfig, tools: &T) -> Result<usize> {
    let start = Instant::now();
    let corpus = Corpus::new(&config.bitcode);

    for dir in [&config.bitcode, &config.stats] {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }

    let mut collected = 0;

    for source in corpus::list_bitcode(&config.source)? {
        if collected == config.limit {
            break;
        }

        let bitcode = fs::read(&source).map_err(|e| Error::io(&source, e))?;
        let sample = corpus.sample(collected + 1);

        match tools.round_trip(&bitcode, &sample) {
            Ok(()) => {}
            Err(err @ Error::ToolFailed { .. }) => {
                display::print_warning(&format!("skipping {}: {err}", source.display()));
                continue;
            }
            Err(err) => return Err(err),
        }

        collected += 1;

        let block = stats_block(tools, &sample, collected)?;
        let stats = stats_file_for(&config.stats, collected, config.files_per_stats);

        AppendLog::new(&stats).append(&block)?;
        display::print_sample_collected(collected, &stats);
    }

    display::print_summary("samples", collected, start.elapsed());

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::{Command, ExitStatus};

    fn failed_status() -> ExitStatus {
        Command::new("false").status().unwrap()
    }

    /// Copies bitcode verbatim, refusing anything starting with `bad`.
    struct CopyTools;

    impl RoundTrip for CopyTools {
        fn round_trip(&self, bitcode: &[u8], output: &Path) -> Result<()> {
            if bitcode.starts_with(b"bad") {
                return Err(Error::ToolFailed {
                    program: PathBuf::from("llvm-dis"),
                    status: failed_status(),
                    stderr: "invalid bitcode signature".to_string(),
                });
            }

            fs::write(output, bitcode).map_err(|e| Error::io(output, e))
        }
    }

    impl Optimizer for CopyTools {
        fn optimize(&self, _: &Path, level: Option<OptLevel>, _: Option<&str>) -> Result<String> {
            let count = level.map_or(0, |l| l.name().len());

            Ok(format!(
                "preamble\n... Statistics Collected ...\n  {count} pass - Things\n"
            ))
        }
    }

    #[test]
    fn stats_files_group_samples() {
        assert_eq!(stats_file_index(1, 10), 1);
        assert_eq!(stats_file_index(10, 10), 1);
        assert_eq!(stats_file_index(11, 10), 2);
        assert_eq!(stats_file_index(3, 0), 3);
    }

    #[test]
    fn block_has_every_level() {
        let block = stats_block(&CopyTools, Path::new("test_1.bc"), 1).unwrap();
        let headers: Vec<_> = block.lines().filter(|l| l.ends_with("STATS> ")).collect();

        assert!(block.starts_with("====================================  STATS FOR FILE : 1 "));
        assert_eq!(
            headers,
            [
                "PLAIN STATS> ",
                "O1 STATS> ",
                "O2 STATS> ",
                "O3 STATS> ",
                "Os STATS> ",
                "Oz STATS> "
            ]
        );
        assert!(!block.contains("preamble"));
        assert!(block.contains("  0 pass - Things"));
    }

    #[cfg(unix)]
    #[test]
    fn collection_numbers_successful_samples() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("corpus");

        fs::create_dir(&source).unwrap();

        for (name, contents) in [("a.bc", "BC-a"), ("b.bc", "bad"), ("c.bc", "BC-c"), ("d.bc", "BC-d")] {
            fs::write(source.join(name), contents).unwrap();
        }

        let config = CollectConfig {
            source,
            limit: 2,
            bitcode: dir.path().join("bitcode"),
            stats: dir.path().join("stats"),
            files_per_stats: 1,
        };

        assert_eq!(collect_corpus(&config, &CopyTools).unwrap(), 2);
        assert_eq!(fs::read(config.bitcode.join("test_1.bc")).unwrap(), b"BC-a");
        assert_eq!(fs::read(config.bitcode.join("test_2.bc")).unwrap(), b"BC-c");
        assert!(!config.bitcode.join("test_3.bc").exists());

        let second = fs::read_to_string(config.stats.join("stats_2.txt")).unwrap();

        assert!(second.contains("STATS FOR FILE : 2 "));
        assert!(!config.stats.join("stats_3.txt").exists());
    }
}
