//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Knobs and the values they can be set to.

use crate::error::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A value a knob can take on the `opt` command line.
///
/// Whether a knob is integral or floating-point is decided once when its
/// default is parsed, everything downstream matches on this instead of
/// re-probing the text.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KnobValue {
    /// Integral knobs. `i128` so that `u64::MAX` style defaults fit.
    Integer(i128),
    /// Floating-point knobs.
    Float(f64),
}

impl KnobValue {
    /// Parses a default value as written in LLVM source.
    ///
    /// Integers are tried first, then floats (with an optional `f` suffix as
    /// in `0.5f`). Anything else is rejected, as are integers no C++ integer
    /// type could hold.
    pub fn parse(knob: &str, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let invalid = || Error::InvalidKnobValue {
            knob: knob.to_string(),
            value: text.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid());
        }

        if let Ok(i) = trimmed.parse::<i128>() {
            if !(i64::MIN as i128..=u64::MAX as i128).contains(&i) {
                return Err(invalid());
            }

            return Ok(Self::Integer(i));
        }

        let float = trimmed.strip_suffix('f').unwrap_or(trimmed);

        float
            .parse::<f64>()
            .map(Self::Float)
            .map_err(|_| invalid())
    }

    /// The value as a float, used for ordering mixed lists.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// Total order over values, integers compared exactly.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for KnobValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            // `{:?}` keeps the `.0` on integral floats, so `opt` sees a float literal
            Self::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// A knob under study: its `cl::opt` identifier and its default value.
#[derive(Clone, Debug, PartialEq)]
pub struct Knob {
    name: String,
    baseline: KnobValue,
}

impl Knob {
    /// Creates a knob from an already-parsed value.
    pub fn new(name: impl Into<String>, baseline: KnobValue) -> Self {
        Self {
            name: name.into(),
            baseline,
        }
    }

    /// Parses the raw default text for `name`.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        Ok(Self::new(name, KnobValue::parse(name, value)?))
    }

    /// The identifier passed to `opt` as `-<name>=<value>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default value of the knob.
    pub fn baseline(&self) -> KnobValue {
        self.baseline
    }

    /// The command-line override for setting this knob to `value`.
    pub fn flag(&self, value: KnobValue) -> String {
        format!("-{}={value}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integers_before_floats() {
        assert_eq!(KnobValue::parse("k", "42").unwrap(), KnobValue::Integer(42));
        assert_eq!(KnobValue::parse("k", " -3 ").unwrap(), KnobValue::Integer(-3));
        assert_eq!(
            KnobValue::parse("k", "18446744073709551615").unwrap(),
            KnobValue::Integer(u64::MAX as i128)
        );
        assert_eq!(KnobValue::parse("k", "0.25").unwrap(), KnobValue::Float(0.25));
        assert_eq!(KnobValue::parse("k", "1.5f").unwrap(), KnobValue::Float(1.5));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        assert!(matches!(
            KnobValue::parse("enable-foo", "false"),
            Err(Error::InvalidKnobValue { .. })
        ));
        assert!(KnobValue::parse("k", "").is_err());
        assert!(KnobValue::parse("k", "f").is_err());
    }

    #[test]
    fn parse_rejects_out_of_range_integers() {
        assert!(matches!(
            KnobValue::parse("k", "100000000000000000000000000000000000000"),
            Err(Error::InvalidKnobValue { .. })
        ));
        assert!(KnobValue::parse("k", "18446744073709551616").is_err());
        assert!(KnobValue::parse("k", "-9223372036854775809").is_err());
        assert_eq!(
            KnobValue::parse("k", "-9223372036854775808").unwrap(),
            KnobValue::Integer(i64::MIN as i128)
        );
    }

    #[test]
    fn flags_render_like_source_literals() {
        let knob = Knob::parse("inline-threshold", "225").unwrap();

        assert_eq!(knob.flag(KnobValue::Integer(250)), "-inline-threshold=250");
        assert_eq!(knob.flag(KnobValue::Float(1.0)), "-inline-threshold=1.0");
        assert_eq!(knob.flag(KnobValue::Float(0.9)), "-inline-threshold=0.9");
    }

    #[test]
    fn ordering_is_exact_for_integers() {
        let big = KnobValue::Integer(u64::MAX as i128);
        let less = KnobValue::Integer(u64::MAX as i128 - 1);

        assert_eq!(less.total_cmp(&big), Ordering::Less);
        assert_eq!(
            KnobValue::Float(0.5).total_cmp(&KnobValue::Integer(1)),
            Ordering::Less
        );
    }
}
