//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

#![deny(
    unreachable_pub,
    missing_docs,
    missing_abi,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]

//! # knobstudy
//!
//! Measures how LLVM's tunable `cl::opt` knobs change the statistics `opt`
//! reports. For every knob a set of candidate values is derived from its
//! default, each value is run over a corpus of bitcode samples at every
//! optimization level, and the statistics that actually move are exported
//! as JSON.
//!
//! The pieces, roughly in the order data flows through them:
//!
//! - [`decode`] recovers knob defaults from LLVM sources
//! - [`collect`] builds the numbered sample corpus
//! - [`values`] picks the candidate values for a knob
//! - [`study`] fans chunks of the corpus out to [`worker::Worker`]s
//! - [`aggregate`] and [`export`] merge, filter and write the results
//! - [`analysis`] does the same for statistics collected by earlier runs

pub mod aggregate;
pub mod analysis;
pub mod chunk;
pub mod collect;
pub mod config;
pub mod corpus;
pub mod decode;
pub mod display;
pub mod error;
pub mod export;
pub mod knob;
pub mod logfile;
pub mod reference;
pub mod stats;
pub mod study;
pub mod toolchain;
pub mod values;
pub mod worker;

#[cfg(feature = "dev-tools")]
pub mod cli;

pub use error::{Error, Result};
pub use knob::{Knob, KnobValue};
pub use toolchain::{OptLevel, Optimizer, RoundTrip, Toolchain};
