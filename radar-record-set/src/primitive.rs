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

//! Avro binary primitives written straight to a sink.

use std::io::Write;

use radar_varint::{put_i32, put_i64};
use tracing::instrument;

use crate::{Error, Result};

/// Union branch holding `null` in a `["null", T]` union.
pub const NULL_BRANCH: usize = 0;

/// Union branch holding the value in a `["null", T]` union.
pub const VALUE_BRANCH: usize = 1;

fn length(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::LengthOverflow(len))
}

/// Writes Avro primitives to a borrowed sink, counting the bytes written.
///
/// Nothing is buffered: every call is passed to the sink as it is made, so a
/// failing sink leaves whatever was written before the failure in place.
#[derive(Debug)]
pub struct Encoder<'a, W> {
    writer: &'a mut W,
    written: u64,
}

impl<'a, W> Encoder<'a, W>
where
    W: Write,
{
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).map_err(Error::sink_write)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn write_int(&mut self, n: i32) -> Result<()> {
        self.put(&put_i32(n))
    }

    pub fn write_long(&mut self, n: i64) -> Result<()> {
        self.put(&put_i64(n))
    }

    /// The branch of a union, zigzag encoded like any other int.
    pub fn write_index(&mut self, branch: usize) -> Result<()> {
        length(branch).and_then(|branch| self.write_int(branch))
    }

    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// A `["null", "string"]` union.
    pub fn write_nullable_string(&mut self, s: Option<&str>) -> Result<()> {
        match s {
            None => self.write_index(NULL_BRANCH),
            Some(s) => self
                .write_index(VALUE_BRANCH)
                .and_then(|()| self.write_string(s)),
        }
    }

    #[instrument(skip_all, fields(len = b.len()), level = "trace")]
    pub fn write_bytes(&mut self, b: &[u8]) -> Result<()> {
        length(b.len())
            .and_then(|len| self.write_int(len))
            .and_then(|()| self.put(b))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(Error::sink_write)
    }
}
