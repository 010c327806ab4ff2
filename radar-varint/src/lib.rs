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

//! Variable length integers as used by the Avro binary encoding.
//!
//! Signed values are zigzag mapped onto unsigned values, so that small
//! magnitudes of either sign stay small, and then written as base 128
//! little endian groups with the high bit of each byte marking continuation.

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    elided_lifetimes_in_paths
)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    unreachable_pub,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

use std::{io, result, sync::Arc};

use bytes::{Buf, BufMut, Bytes, BytesMut};

#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    #[error("io")]
    Io(Arc<io::Error>),

    #[error("varint truncated")]
    VarIntTruncated,

    #[error("varint overflow")]
    VarIntOverflow,
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

pub type Result<R, E = Error> = result::Result<R, E>;

const CONTINUATION: u8 = 0b1000_0000;
const MASK: u8 = 0b0111_1111;
const GROUP_BITS: u32 = 7;

/// The longest varint holding 32 bits.
pub const MAX_I32_LEN: usize = 5;

/// The longest varint holding 64 bits.
pub const MAX_I64_LEN: usize = 10;

#[allow(clippy::cast_sign_loss)]
pub fn en_zigzag(decoded: i32) -> u32 {
    ((decoded << 1) ^ (decoded >> 31)) as u32
}

#[allow(clippy::cast_possible_wrap)]
pub fn de_zigzag(encoded: u32) -> i32 {
    ((encoded >> 1) as i32) ^ -((encoded & 1) as i32)
}

#[allow(clippy::cast_sign_loss)]
pub fn en_zigzag_i64(decoded: i64) -> u64 {
    ((decoded << 1) ^ (decoded >> 63)) as u64
}

#[allow(clippy::cast_possible_wrap)]
pub fn de_zigzag_i64(encoded: u64) -> i64 {
    ((encoded >> 1) as i64) ^ -((encoded & 1) as i64)
}

/// Accumulate at most `max_groups` groups drawn from `next_byte`.
///
/// Bits shifted beyond 64 are an overflow, as is a continuation bit on the
/// last permitted group.
fn decode<F>(max_groups: usize, mut next_byte: F) -> Result<u64>
where
    F: FnMut() -> Result<Option<u8>>,
{
    let mut accumulator = 0u64;

    for group in 0..max_groups {
        let byte = next_byte()?.ok_or(Error::VarIntTruncated)?;
        let shift = GROUP_BITS * group as u32;
        let bits = u64::from(byte & MASK);

        if bits.checked_shl(shift).map(|shifted| shifted >> shift) != Some(bits) {
            return Err(Error::VarIntOverflow);
        }

        accumulator |= bits << shift;

        if byte & CONTINUATION == 0 {
            return Ok(accumulator);
        }
    }

    Err(Error::VarIntOverflow)
}

fn next_from(bytes: &mut Bytes) -> impl FnMut() -> Result<Option<u8>> + '_ {
    move || Ok(bytes.has_remaining().then(|| bytes.get_u8()))
}

pub fn get_u64(bytes: &mut Bytes) -> Result<u64> {
    decode(MAX_I64_LEN, next_from(bytes))
}

pub fn get_u32(bytes: &mut Bytes) -> Result<u32> {
    decode(MAX_I32_LEN, next_from(bytes))
        .and_then(|value| u32::try_from(value).map_err(|_| Error::VarIntOverflow))
}

pub fn get_i32(bytes: &mut Bytes) -> Result<i32> {
    get_u32(bytes).map(de_zigzag)
}

pub fn get_i64(bytes: &mut Bytes) -> Result<i64> {
    get_u64(bytes).map(de_zigzag_i64)
}

/// Base 128 groups, least significant first, returning the number written.
pub fn put_u64_into<B>(value: u64, encoded: &mut B) -> usize
where
    B: BufMut,
{
    let mut remaining = value;
    let mut written = 0;

    loop {
        let group = (remaining & u64::from(MASK)) as u8;
        remaining >>= GROUP_BITS;
        written += 1;

        if remaining == 0 {
            encoded.put_u8(group);
            break written;
        }

        encoded.put_u8(group | CONTINUATION);
    }
}

pub fn put_u32_into<B>(value: u32, encoded: &mut B) -> usize
where
    B: BufMut,
{
    put_u64_into(u64::from(value), encoded)
}

pub fn put_i32_into<B>(value: i32, encoded: &mut B) -> usize
where
    B: BufMut,
{
    put_u32_into(en_zigzag(value), encoded)
}

pub fn put_i64_into<B>(value: i64, encoded: &mut B) -> usize
where
    B: BufMut,
{
    put_u64_into(en_zigzag_i64(value), encoded)
}

fn encoded(capacity: usize, put: impl FnOnce(&mut BytesMut) -> usize) -> Bytes {
    let mut bytes = BytesMut::with_capacity(capacity);
    _ = put(&mut bytes);
    bytes.freeze()
}

pub fn put_u64(value: u64) -> Bytes {
    encoded(MAX_I64_LEN, |bytes| put_u64_into(value, bytes))
}

/// Zigzag varint encoding of a 32 bit signed integer.
pub fn put_i32(value: i32) -> Bytes {
    encoded(MAX_I32_LEN, |bytes| put_i32_into(value, bytes))
}

pub fn put_i64(value: i64) -> Bytes {
    encoded(MAX_I64_LEN, |bytes| put_i64_into(value, bytes))
}

/// The number of bytes [`put_i32`] would produce for this value.
pub fn size_of_i32(value: i32) -> usize {
    let significant = u32::BITS - en_zigzag(value).leading_zeros();
    significant.div_ceil(GROUP_BITS).max(1) as usize
}

/// Varints read from and written to `std::io`.
pub mod blocking {
    use std::io::{Read, Write};

    use bytes::{BufMut, Bytes, BytesMut};

    use super::{Error, MAX_I32_LEN, Result, de_zigzag, decode, put_i32, put_i64};

    /// Read one zigzag varint, returning the value with the bytes it used.
    pub fn read_i32<R: Read>(r: &mut R) -> Result<(i32, Bytes)> {
        let mut consumed = BytesMut::with_capacity(MAX_I32_LEN);

        let value = decode(MAX_I32_LEN, || {
            let mut byte = [0u8; 1];

            if r.read(&mut byte)? == 0 {
                Ok(None)
            } else {
                consumed.put_u8(byte[0]);
                Ok(Some(byte[0]))
            }
        })?;

        u32::try_from(value)
            .map(|value| (de_zigzag(value), consumed.freeze()))
            .map_err(|_| Error::VarIntOverflow)
    }

    pub fn write_i32<W: Write>(w: &mut W, value: i32) -> Result<usize> {
        let encoded = put_i32(value);
        w.write_all(&encoded).map(|()| encoded.len()).map_err(Into::into)
    }

    pub fn write_i64<W: Write>(w: &mut W, value: i64) -> Result<usize> {
        let encoded = put_i64(value);
        w.write_all(&encoded).map(|()| encoded.len()).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_read() {
        assert!(matches!(
            get_u64(&mut Bytes::new()),
            Err(Error::VarIntTruncated)
        ));
    }

    #[test]
    fn get_i32_truncated() {
        assert!(matches!(
            get_i32(&mut Bytes::from_static(&[0x80, 0x80])),
            Err(Error::VarIntTruncated)
        ))
    }

    #[test]
    fn get_i32_overflow() {
        assert!(matches!(
            get_i32(&mut Bytes::from_static(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01])),
            Err(Error::VarIntOverflow)
        ))
    }

    #[test]
    fn zigzag() {
        assert_eq!(0, en_zigzag(0));
        assert_eq!(1, en_zigzag(-1));
        assert_eq!(2, en_zigzag(1));
        assert_eq!(3, en_zigzag(-2));
        assert_eq!(4, en_zigzag(2));
        assert_eq!(u32::MAX, en_zigzag(i32::MIN));
        assert_eq!(u32::MAX - 1, en_zigzag(i32::MAX));
    }

    #[test]
    fn put_small() {
        assert_eq!(&[0x00][..], &put_i32(0)[..]);
        assert_eq!(&[0x01][..], &put_i32(-1)[..]);
        assert_eq!(&[0x02][..], &put_i32(1)[..]);
        assert_eq!(&[0x28][..], &put_i32(20)[..]);
        assert_eq!(&[0x7f][..], &put_i32(-64)[..]);
        assert_eq!(&[0x80, 0x01][..], &put_i32(64)[..]);
    }

    #[test]
    fn put_extremes() {
        assert_eq!(&[0xff, 0xff, 0xff, 0xff, 0x0f][..], &put_i32(i32::MIN)[..]);
        assert_eq!(&[0xfe, 0xff, 0xff, 0xff, 0x0f][..], &put_i32(i32::MAX)[..]);
        assert_eq!(5, size_of_i32(i32::MIN));
        assert_eq!(1, size_of_i32(-64));
        assert_eq!(2, size_of_i32(64));
    }

    #[test]
    fn u64_extremes() -> Result<()> {
        for value in [u64::MIN, 1 << 63, u64::MAX] {
            assert_eq!(value, get_u64(&mut put_u64(value))?);
        }

        assert_eq!(MAX_I64_LEN, put_u64(u64::MAX).len());
        assert_eq!(i64::MIN, get_i64(&mut put_i64(i64::MIN))?);
        Ok(())
    }

    #[test]
    fn u32_bits_beyond_range() {
        // five groups carrying 35 bits
        assert!(matches!(
            get_u32(&mut Bytes::from_static(&[0xff, 0xff, 0xff, 0xff, 0x7f])),
            Err(Error::VarIntOverflow)
        ));
    }

    #[test]
    fn blocking_read_write() -> Result<()> {
        let mut buffer = Vec::new();
        assert_eq!(5, blocking::write_i32(&mut buffer, i32::MIN)?);
        assert_eq!(1, blocking::write_i64(&mut buffer, -1)?);

        let mut reader = &buffer[..];
        let (value, encoded) = blocking::read_i32(&mut reader)?;
        assert_eq!(i32::MIN, value);
        assert_eq!(&buffer[..5], &encoded[..]);

        let (value, _) = blocking::read_i32(&mut reader)?;
        assert_eq!(-1, value);

        assert!(matches!(
            blocking::read_i32(&mut reader),
            Err(Error::VarIntTruncated)
        ));

        Ok(())
    }
}
