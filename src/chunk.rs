//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Splitting the corpus between sweep jobs.

use std::ops::RangeInclusive;

/// Splits the corpus indices `1..=total` into contiguous chunks of at most
/// `chunk_size` indices each, in order. The last chunk may be shorter.
///
/// Corpus files are numbered from 1, so the chunks are too.
pub fn partition(total: usize, chunk_size: usize) -> Vec<RangeInclusive<usize>> {
    let chunk_size = chunk_size.max(1);

    (1..=total)
        .step_by(chunk_size)
        .map(|start| start..=usize::min(start + chunk_size - 1, total))
        .collect()
}
