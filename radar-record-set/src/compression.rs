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

//! Gzip compression of a record set, as sent with `Content-Encoding: gzip`.

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use flate2::{Compression, write::GzEncoder};
use tracing::debug;

use crate::{Error, Result, request::RecordBatchRequest, source::RecordBatchSource};

/// Compress a record set into `writer`.
///
/// Returns the length of the record set before compression, with the writer
/// handed back once the gzip trailer has been written.
pub fn gzip_into<S, W>(request: &mut RecordBatchRequest<'_, S>, writer: W) -> Result<(u64, W)>
where
    S: RecordBatchSource,
    W: Write,
{
    let mut gz = GzEncoder::new(writer, Compression::default());
    let written = request.write_to_sink(&mut gz)?;
    debug!(written);
    gz.finish()
        .map(|writer| (written, writer))
        .map_err(Error::sink_write)
}

pub fn gzip<S>(request: &mut RecordBatchRequest<'_, S>) -> Result<Bytes>
where
    S: RecordBatchSource,
{
    gzip_into(request, BytesMut::new().writer()).map(|(_, writer)| writer.into_inner().freeze())
}
