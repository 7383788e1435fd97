//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The unit of work a sweep job runs: one knob, every value, one chunk.

use crate::corpus::Corpus;
use crate::display;
use crate::error::Result;
use crate::knob::{Knob, KnobValue};
use crate::logfile::AppendLog;
use crate::stats::{self, StatRecord, StatsParser};
use crate::toolchain::{OptLevel, Optimizer};
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Everything a sweep job needs, cheap to clone into each job.
pub struct Worker<O> {
    optimizer: Arc<O>,
    parser: Arc<StatsParser>,
    corpus: Corpus,
    invalid: Arc<AppendLog>,
    verbose: bool,
}

impl<O> Clone for Worker<O> {
    fn clone(&self) -> Self {
        Self {
            optimizer: Arc::clone(&self.optimizer),
            parser: Arc::clone(&self.parser),
            corpus: self.corpus.clone(),
            invalid: Arc::clone(&self.invalid),
            verbose: self.verbose,
        }
    }
}

impl<O: Optimizer> Worker<O> {
    /// Creates a worker. `invalid` is where knobs `opt` rejects a value for
    /// get recorded.
    pub fn new(
        optimizer: Arc<O>,
        parser: Arc<StatsParser>,
        corpus: Corpus,
        invalid: Arc<AppendLog>,
        verbose: bool,
    ) -> Self {
        Self {
            optimizer,
            parser,
            corpus,
            invalid,
            verbose,
        }
    }

    /// Measures every value in `values` on every sample in `chunk`, at every
    /// optimization level. Returns one record per value, in the same order.
    ///
    /// Samples, values and levels are run strictly one after another. A value
    /// `opt` rejects is logged and measured anyway (it will usually produce
    /// nothing). Only failing to launch the optimizer is an error.
    pub fn sweep(
        &self,
        knob: &Knob,
        values: &[KnobValue],
        chunk: RangeInclusive<usize>,
    ) -> Result<Vec<StatRecord>> {
        let mut records = vec![StatRecord::new(); values.len()];

        for index in chunk {
            let sample = self.corpus.sample(index);

            for (record, &value) in records.iter_mut().zip(values) {
                let flag = knob.flag(value);

                for level in OptLevel::ALL {
                    let output = self.optimizer.optimize(&sample, Some(level), Some(&flag))?;

                    if stats::rejected_value(&output) {
                        self.invalid.append_line(knob.name())?;
                    }

                    self.parser.accumulate_output(&output, record);
                }

                if self.verbose {
                    display::print_value_collected(knob.name(), value, index);
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Stat, COMPILE_TIME};
    use std::path::Path;
    use std::sync::Mutex;

    /// Pretends every run combined `value` instructions and took 0.5s.
    #[derive(Default)]
    struct EchoOptimizer {
        calls: Mutex<Vec<String>>,
    }

    impl Optimizer for EchoOptimizer {
        fn optimize(
            &self,
            input: &Path,
            level: Option<OptLevel>,
            knob: Option<&str>,
        ) -> Result<String> {
            let knob = knob.unwrap_or_default();
            let value = knob.rsplit('=').next().unwrap_or("0");

            self.calls.lock().unwrap().push(format!(
                "{} {} {knob}",
                input.display(),
                level.map_or("", OptLevel::name)
            ));

            if value.starts_with('-') {
                return Ok(format!("opt: for the {knob} option: value invalid for uint argument!"));
            }

            Ok(format!(
                "... Statistics Collected ...\n  {value} instcombine - Number of insts combined\n\n       0.5 seconds time elapsed\n"
            ))
        }
    }

    fn worker(optimizer: Arc<EchoOptimizer>, log: &Path) -> Worker<EchoOptimizer> {
        Worker::new(
            optimizer,
            Arc::new(StatsParser::new()),
            Corpus::new("bitcode"),
            Arc::new(AppendLog::new(log)),
            false,
        )
    }

    #[test]
    fn sweeps_every_sample_value_and_level() {
        let dir = tempfile::tempdir().unwrap();
        let optimizer = Arc::new(EchoOptimizer::default());
        let worker = worker(Arc::clone(&optimizer), &dir.path().join("invalid.txt"));
        let knob = Knob::new("some-knob", KnobValue::Integer(2));
        let values = [KnobValue::Integer(1), KnobValue::Integer(3)];

        let records = worker.sweep(&knob, &values, 4..=5).unwrap();
        let calls = optimizer.calls.lock().unwrap();

        assert_eq!(calls.len(), 2 * 2 * 5);
        assert_eq!(calls[0], "bitcode/test_4.bc O1 -some-knob=1");
        assert_eq!(calls[5], "bitcode/test_4.bc O1 -some-knob=3");
        assert_eq!(calls[10], "bitcode/test_5.bc O1 -some-knob=1");

        let key = "Number of insts combined (instcombine)";

        // 2 samples * 5 levels
        assert_eq!(records[0].get(key), Some(Stat::Count(10)));
        assert_eq!(records[1].get(key), Some(Stat::Count(30)));
        assert_eq!(records[1].get(COMPILE_TIME), Some(Stat::Seconds(5.0)));
        assert!(!dir.path().join("invalid.txt").exists());
    }

    #[test]
    fn rejected_values_are_logged_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("invalid.txt");
        let worker = worker(Arc::new(EchoOptimizer::default()), &log);
        let knob = Knob::new("some-knob", KnobValue::Integer(-1));
        let values = [KnobValue::Integer(-1), KnobValue::Integer(1)];

        let records = worker.sweep(&knob, &values, 1..=1).unwrap();

        assert!(records[0].is_empty());
        assert!(!records[1].is_empty());

        let logged = std::fs::read_to_string(log).unwrap();

        assert_eq!(logged.lines().count(), 5);
        assert!(logged.lines().all(|l| l == "some-knob"));
    }
}
