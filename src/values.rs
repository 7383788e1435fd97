//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Generates the list of values each knob is swept over.
//!
//! The sweep covers roughly 50% to 150% of the default in steps of 10%,
//! plus two far-out multiples. Knobs whose default is an all-ones style
//! maximum are instead walked down from that maximum towards zero, since
//! anything above it is meaningless.

use crate::knob::KnobValue;
use smallvec::SmallVec;

/// The candidate values for one knob, sorted ascending. Never more than 13.
pub type Candidates = SmallVec<[KnobValue; 13]>;

/// Integer defaults that mean "maximum" rather than a tuned number.
pub const SENTINEL_MAXIMA: [i128; 5] = [
    u64::MAX as i128,
    u16::MAX as i128,
    u32::MAX as i128,
    1 << 23,
    i32::MAX as i128,
];

const STEPS_DOWN: usize = 6;
const TOTAL_STEPS: usize = 11;

// products are rounded half-to-even on the float, matching how the
// historical results were generated
fn round_scaled(n: i128, factor: f64) -> i128 {
    (n as f64 * factor).round_ties_even() as i128
}

fn sentinel_values(max: i128) -> Candidates {
    let step = round_scaled(max, 0.10);
    let mut values = Candidates::new();
    let mut current = max;

    values.push(KnobValue::Integer(round_scaled(max, 0.05)));
    values.push(KnobValue::Integer(round_scaled(max, 0.95)));

    for _ in 0..TOTAL_STEPS {
        values.push(KnobValue::Integer(current));
        current = current.saturating_sub(step);

        if current < 0 {
            values.push(KnobValue::Integer(0));
            break;
        }
    }

    values
}

fn float_values(baseline: f64) -> Candidates {
    let step = match baseline * 0.1 {
        s if s == 0.0 => 1.0,
        s => s,
    };

    let mut values = Candidates::new();
    let mut current = baseline;

    for _ in 0..STEPS_DOWN {
        values.push(KnobValue::Float(current));
        current -= step;
    }

    current = baseline + step;

    for _ in STEPS_DOWN..TOTAL_STEPS {
        values.push(KnobValue::Float(current));
        current += step;
    }

    if baseline == 0.0 {
        values.push(KnobValue::Float(20.0));
        values.push(KnobValue::Float(100.0));
    } else {
        let max = values
            .iter()
            .map(|v| v.as_f64())
            .fold(f64::NEG_INFINITY, f64::max);
        let mult = max / baseline + 1.0;

        values.push(KnobValue::Float(baseline * mult));
        values.push(KnobValue::Float(baseline * (mult + 9.0)));
    }

    values
}

fn negative_values(baseline: i128) -> Candidates {
    let step = match round_scaled(baseline, 0.1) {
        0 => 1,
        s => s.abs(),
    };

    let mut values = Candidates::new();

    let below = |i: i128| baseline.saturating_sub(i.saturating_mul(step));
    let above = |i: i128| baseline.saturating_add(i.saturating_mul(step));

    values.extend((0..STEPS_DOWN as i128).map(|i| KnobValue::Integer(below(i))));
    values.extend((1..=(TOTAL_STEPS - STEPS_DOWN) as i128).map(|i| KnobValue::Integer(above(i))));

    let max = above((TOTAL_STEPS - STEPS_DOWN) as i128);
    let min = below(STEPS_DOWN as i128 - 1);

    values.push(KnobValue::Integer(max.saturating_mul(2)));
    values.push(KnobValue::Integer(min.saturating_mul(2)));

    values
}

fn non_negative_values(baseline: i128) -> Candidates {
    let step = match round_scaled(baseline, 0.1) {
        0 => 1,
        s => s,
    };

    let mut values = Candidates::new();
    let mut current = baseline;
    let mut taken = 0;

    // the downward walk may end early, the upward one makes up the difference
    while current >= 0 && taken < STEPS_DOWN {
        values.push(KnobValue::Integer(current));
        current -= step;
        taken += 1;
    }

    current = baseline.saturating_add(step);

    while taken < TOTAL_STEPS {
        values.push(KnobValue::Integer(current));
        current = current.saturating_add(step);
        taken += 1;
    }

    if baseline == 0 {
        values.push(KnobValue::Integer(20));
        values.push(KnobValue::Integer(100));
    } else {
        let max = current.saturating_sub(step);
        let mut mult = (max as f64 / baseline as f64).round_ties_even() as i128 + 1;

        values.push(KnobValue::Integer(baseline.saturating_mul(mult)));
        mult += 9;
        values.push(KnobValue::Integer(baseline.saturating_mul(mult)));
    }

    values
}

fn as_sentinel(x: f64) -> Option<i128> {
    let n = x as i128;

    (n as f64 == x && SENTINEL_MAXIMA.contains(&n)).then_some(n)
}

/// Returns the sorted list of values to sweep a knob with default `baseline`
/// over. This is a pure function of `baseline`.
///
/// A float default equal to a sentinel maximum is walked down like the
/// integer one, but the values stay floats.
pub fn candidate_values(baseline: KnobValue) -> Candidates {
    let mut values = match baseline {
        KnobValue::Integer(n) if SENTINEL_MAXIMA.contains(&n) => sentinel_values(n),
        KnobValue::Integer(n) if n < 0 => negative_values(n),
        KnobValue::Integer(n) => non_negative_values(n),
        KnobValue::Float(x) => match as_sentinel(x) {
            Some(max) => sentinel_values(max)
                .into_iter()
                .map(|v| KnobValue::Float(v.as_f64()))
                .collect(),
            None => float_values(x),
        },
    };

    values.sort_by(KnobValue::total_cmp);

    values
}
