//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use knobstudy::config::SweepConfig;
use knobstudy::reference::ReferencePaths;
use knobstudy::stats::COMPILE_TIME;
use knobstudy::{study, Error, KnobValue, OptLevel, Optimizer, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Behaves like `perf stat opt -stats` on a module where the knob only
/// matters when it is zero.
struct FakeOpt;

impl Optimizer for FakeOpt {
    fn optimize(&self, _: &Path, level: Option<OptLevel>, knob: Option<&str>) -> Result<String> {
        assert!(level.is_some());

        let value = knob
            .and_then(|flag| flag.rsplit('=').next())
            .expect("sweeps always pass a knob");
        let insts = if value == "0" { 2 } else { 1 };
        let mystery = value.len();

        Ok(format!(
            "warning: preamble\n\
             ===---===\n\
             ... Statistics Collected ...\n\
             ===---===\n\
             \n\
             {insts} pass1 - insts\n\
             1 pass2 - flat\n\
             {mystery} pass3 - noise\n\
             {mystery} pass4 - mystery\n\
             \n\
             Performance counter stats for 'opt':\n\
             \n\
             \x20      0.25 seconds time elapsed\n"
        ))
    }
}

fn write(path: &Path, text: &str) {
    fs::write(path, text).unwrap();
}

fn config(root: &Path) -> SweepConfig {
    write(&root.join("knobs_decoded.txt"), "licm-max: 4\nother: 7\n");
    write(&root.join("knobs.txt"), "licm-max\n");
    write(&root.join("stats_imp.txt"), "insts#pass1#More is Better\n");
    write(&root.join("stats_amb.txt"), "flat#pass2\n");
    write(&root.join("stats_ignore.txt"), "noise#pass3\n");

    SweepConfig {
        knob_table: root.join("knobs_decoded.txt"),
        knob_list: root.join("knobs.txt"),
        references: ReferencePaths {
            important: root.join("stats_imp.txt"),
            ambiguous: root.join("stats_amb.txt"),
            ignored: root.join("stats_ignore.txt"),
        },
        corpus: root.join("bitcode"),
        results: root.join("results"),
        invalid_log: root.join("invalid_knobs.txt"),
        missing_log: root.join("missing_stats.txt"),
        total_files: 2,
        chunk_size: 1,
        jobs: Some(2),
        verbose: false,
    }
}

#[test]
fn sweep_writes_discriminative_stats() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let results = study::run_sweep(&config, Arc::new(FakeOpt)).unwrap();

    assert_eq!(results.len(), 1);

    let result = &results[0];

    assert_eq!(result.knob.name(), "licm-max");
    assert!(result.values.contains(&KnobValue::Integer(4)));
    assert!(result.values.iter().any(|v| v.as_f64() <= 2.0));
    assert!(result.values.iter().any(|v| v.as_f64() >= 5.0));
    assert_eq!(result.values[0], KnobValue::Integer(0));
    assert_eq!(result.unknown, ["mystery (pass4)"]);
    assert_eq!(result.path, config.results.join("licm-max.json"));

    let json: Value = serde_json::from_str(&fs::read_to_string(&result.path).unwrap()).unwrap();
    let object = json.as_object().unwrap();
    let keys: Vec<_> = object.keys().map(String::as_str).collect();

    // flat is constant, noise is ignored
    assert_eq!(keys, [COMPILE_TIME, "insts (pass1)", "mystery (pass4)"]);

    // one sample per chunk, five levels per sample
    let insts = object["insts (pass1)"].as_array().unwrap();

    assert_eq!(insts.len(), result.values.len());
    assert_eq!(insts[0], 20);
    assert_eq!(insts[1], 10);

    let time = object[COMPILE_TIME].as_array().unwrap();

    assert!(time.iter().all(|t| t.as_f64() == Some(2.5)));

    assert_eq!(
        fs::read_to_string(&config.missing_log).unwrap(),
        "Missing stats for knob licm-max:\nmystery (pass4)\n"
    );
    assert!(!config.invalid_log.exists());
}

#[test]
fn unknown_knob_stops_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    write(&config.knob_list, "licm-max\nnot-a-knob\n");

    let result = study::run_sweep(&config, Arc::new(FakeOpt));

    assert!(matches!(result, Err(Error::UnknownKnob(name)) if name == "not-a-knob"));
    assert!(!config.results.exists());
}
