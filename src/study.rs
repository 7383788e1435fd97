//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The sweep coordinator: one knob at a time, chunks of the corpus fanned out
//! over a worker pool, results merged and exported per knob.

use crate::aggregate::{self, ResultTable};
use crate::chunk;
use crate::config::{self, SweepConfig};
use crate::corpus::Corpus;
use crate::display;
use crate::error::{Error, Result};
use crate::export::{self, ExportPolicy};
use crate::knob::{Knob, KnobValue};
use crate::logfile::AppendLog;
use crate::reference::ReferenceTables;
use crate::stats::{StatRecord, StatsParser};
use crate::toolchain::Optimizer;
use crate::values;
use crate::worker::Worker;
use std::any::Any;
use std::ops::RangeInclusive;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Instant;
use threadpool::ThreadPool;

/// What a finished knob produced.
#[derive(Clone, Debug)]
pub struct KnobResult {
    /// The knob that was swept
    pub knob: Knob,
    /// The candidate values, in table order
    pub values: Vec<KnobValue>,
    /// The exported table
    pub table: ResultTable,
    /// Statistics that weren't on any reference table
    pub unknown: Vec<String>,
    /// Where the table was written
    pub path: PathBuf,
}

/// Builds the pool chunks are run on. `None` uses one thread per CPU.
pub fn pool_for_jobs(jobs: Option<usize>) -> ThreadPool {
    match jobs {
        Some(n) => ThreadPool::new(n.max(1)),
        None => ThreadPool::default(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "<non-string panic payload>".to_string(),
        },
    }
}

/// Runs every chunk for `knob` on `pool` and merges what comes back.
///
/// Every chunk is always waited for. If any chunk failed, the error of the
/// lowest-numbered failing chunk is returned and nothing is merged.
pub fn sweep_knob<O: Optimizer + 'static>(
    pool: &ThreadPool,
    worker: &Worker<O>,
    knob: &Knob,
    values: &[KnobValue],
    chunks: &[RangeInclusive<usize>],
) -> Result<Vec<StatRecord>> {
    let (send, recv) = mpsc::channel();
    let values: Arc<[KnobValue]> = Arc::from(values);

    for (index, chunk) in chunks.iter().enumerate() {
        let send = send.clone();
        let worker = worker.clone();
        let knob = knob.clone();
        let values = Arc::clone(&values);
        let chunk = chunk.clone();

        pool.execute(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                worker.sweep(&knob, &values, chunk)
            }));

            let result = result.unwrap_or_else(|payload| {
                Err(Error::WorkerPanic {
                    chunk: index,
                    message: panic_message(payload),
                })
            });

            // the receiver only goes away if the coordinator itself died
            let _ = send.send((index, result));
        });
    }

    // the loop below ends once every job has dropped its sender
    drop(send);

    let mut totals = vec![StatRecord::new(); values.len()];
    let mut failure: Option<(usize, Error)> = None;

    for (index, result) in recv {
        match result {
            Ok(partial) => {
                display::print_chunk_finished(knob.name(), index);
                aggregate::merge_into(&mut totals, partial);
            }
            Err(err) => {
                if failure.as_ref().map_or(true, |(first, _)| index < *first) {
                    failure = Some((index, err));
                }
            }
        }
    }

    match failure {
        Some((_, err)) => Err(err),
        None => Ok(totals),
    }
}

/// Everything shared between the knobs of one sweep.
struct Session<O> {
    pool: ThreadPool,
    worker: Worker<O>,
    references: ReferenceTables,
    missing: AppendLog,
    chunks: Vec<RangeInclusive<usize>>,
    results: PathBuf,
}

impl<O: Optimizer + 'static> Session<O> {
    fn run_knob(&self, knob: &Knob) -> Result<KnobResult> {
        let values = values::candidate_values(knob.baseline()).into_vec();

        display::print_knob_header(knob, &values, self.chunks.len());

        let totals = sweep_knob(&self.pool, &self.worker, knob, &values, &self.chunks)?;
        let table = ResultTable::tabulate(&totals).discriminative();
        let selection = export::select(table, &self.references, ExportPolicy::DropIgnored);

        export::report_unknown(knob.name(), &selection.unknown, &self.missing)?;

        let name = export::file_name_for(knob.name(), ".json");
        let path = export::write_json(&selection.table, &self.results, &name)?;

        display::print_knob_finished(knob.name(), selection.table.len(), &path);

        Ok(KnobResult {
            knob: knob.clone(),
            values,
            table: selection.table,
            unknown: selection.unknown,
            path,
        })
    }
}

/// Sweeps `knobs` in order, writing one JSON file per knob.
///
/// The first knob that fails stops the sweep; files already written for
/// earlier knobs are left in place.
pub fn sweep_knobs<O: Optimizer + 'static>(
    config: &SweepConfig,
    knobs: &[Knob],
    optimizer: Arc<O>,
) -> Result<Vec<KnobResult>> {
    let start = Instant::now();
    let session = Session {
        pool: pool_for_jobs(config.jobs),
        worker: Worker::new(
            optimizer,
            Arc::new(StatsParser::new()),
            Corpus::new(&config.corpus),
            Arc::new(AppendLog::new(&config.invalid_log)),
            config.verbose,
        ),
        references: ReferenceTables::load(&config.references)?,
        missing: AppendLog::new(&config.missing_log),
        chunks: chunk::partition(config.total_files, config.chunk_size),
        results: config.results.clone(),
    };

    let results = knobs
        .iter()
        .map(|knob| session.run_knob(knob))
        .collect::<Result<Vec<_>>>()?;

    display::print_summary("knobs", results.len(), start.elapsed());

    Ok(results)
}

/// Loads the knob list named by `config` and sweeps it.
pub fn run_sweep<O: Optimizer + 'static>(
    config: &SweepConfig,
    optimizer: Arc<O>,
) -> Result<Vec<KnobResult>> {
    let knobs = config::load_knobs(&config.knob_table, &config.knob_list)?;

    sweep_knobs(config, &knobs, optimizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Stat;
    use crate::toolchain::OptLevel;
    use std::path::Path;

    /// Reports one combined instruction per run, except on a poisoned sample.
    struct CountingOptimizer {
        poisoned: Option<&'static str>,
    }

    impl Optimizer for CountingOptimizer {
        fn optimize(&self, input: &Path, _: Option<OptLevel>, _: Option<&str>) -> Result<String> {
            if let Some(poisoned) = self.poisoned {
                if input.ends_with(poisoned) {
                    panic!("cannot optimize {}", input.display());
                }
            }

            Ok("Statistics Collected\n 1 instcombine - Number of insts combined\n".to_string())
        }
    }

    fn worker(poisoned: Option<&'static str>, dir: &Path) -> Worker<CountingOptimizer> {
        Worker::new(
            Arc::new(CountingOptimizer { poisoned }),
            Arc::new(StatsParser::new()),
            Corpus::new("bitcode"),
            Arc::new(AppendLog::new(dir.join("invalid.txt"))),
            false,
        )
    }

    #[test]
    fn chunks_are_merged_by_value_index() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_for_jobs(Some(3));
        let knob = Knob::new("k", KnobValue::Integer(1));
        let values = [KnobValue::Integer(1), KnobValue::Integer(2)];
        let chunks = chunk::partition(7, 2);

        let totals = sweep_knob(&pool, &worker(None, dir.path()), &knob, &values, &chunks).unwrap();

        assert_eq!(totals.len(), 2);

        // 7 samples * 5 levels
        for record in totals {
            assert_eq!(
                record.get("Number of insts combined (instcombine)"),
                Some(Stat::Count(35))
            );
        }
    }

    #[test]
    fn panicking_chunk_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_for_jobs(Some(2));
        let knob = Knob::new("k", KnobValue::Integer(1));
        let chunks = chunk::partition(4, 2);
        let worker = worker(Some("test_3.bc"), dir.path());

        let result = sweep_knob(&pool, &worker, &knob, &[KnobValue::Integer(1)], &chunks);

        match result {
            Err(Error::WorkerPanic { chunk, message }) => {
                assert_eq!(chunk, 1);
                assert!(message.contains("test_3.bc"));
            }
            other => panic!("expected a worker panic, got {other:?}"),
        }

        // the pool survives a panicking job
        let totals = sweep_knob(
            &pool,
            &worker,
            &knob,
            &[KnobValue::Integer(1)],
            &chunks[..1],
        )
        .unwrap();

        assert_eq!(totals.len(), 1);
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(5)), "<non-string panic payload>");
    }
}
