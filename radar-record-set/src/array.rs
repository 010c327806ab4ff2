// Copyright ⓒ 2024-2025 Peter Morgan <peter.james.morgan@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Blocked array framing.
//!
//! An Avro array is a series of blocks, each a count followed by that many
//! items, ending with a block of count zero.

use std::{io::Write, num::NonZeroUsize};

use bytes::Bytes;
use tracing::debug;

use crate::{Error, Result, primitive::Encoder};

/// How the items of an array are split into blocks.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum BlockPolicy {
    /// One block holding every item.
    #[default]
    Single,

    /// Blocks of at most this many items.
    MaxItems(NonZeroUsize),
}

impl BlockPolicy {
    fn block_len(&self, remaining: usize) -> usize {
        match self {
            Self::Single => remaining,
            Self::MaxItems(max) => remaining.min(max.get()),
        }
    }
}

fn count(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::LengthOverflow(len))
}

/// Write `declared` blobs drawn from `items` as a blocked array of bytes.
///
/// Items are written as they are produced. An empty array is written as an
/// empty block followed by the terminating block. The iterator must produce
/// exactly `declared` items: the first item error aborts the write with
/// [`Error::Source`] and a length disagreement with
/// [`Error::SourceLengthMismatch`].
///
/// Returns the number of items written.
pub fn write_blocked_array<W, I>(
    encoder: &mut Encoder<'_, W>,
    declared: usize,
    items: I,
    policy: BlockPolicy,
) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Result<Bytes>>,
{
    let mut items = items.into_iter();
    let mut produced = 0;

    if declared == 0 {
        encoder.write_int(0)?;
    }

    while produced < declared {
        let block = policy.block_len(declared - produced);
        debug!(block, produced, declared);

        encoder.write_int(count(block)?)?;

        for _ in 0..block {
            let item = items
                .next()
                .ok_or(Error::SourceLengthMismatch { declared, produced })?
                .map_err(|error| Error::Source(Box::new(error)))?;

            encoder.write_bytes(&item)?;
            produced += 1;
        }
    }

    if items.next().is_some() {
        return Err(Error::SourceLengthMismatch {
            declared,
            produced: produced + 1,
        });
    }

    encoder.write_int(0).map(|()| produced)
}
