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

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, instrument};

use crate::{
    Result,
    array::{BlockPolicy, write_blocked_array},
    metadata::SchemaVersionMetadata,
    primitive::Encoder,
    source::RecordBatchSource,
};

/// A record set, ready to be written.
///
/// Holding a request means the metadata has been validated: there is no
/// unprepared request. Each write drains the values of the source again, so
/// writing more than once needs a source that can replay its values.
#[derive(Debug)]
pub struct RecordBatchRequest<'a, S> {
    key: &'a SchemaVersionMetadata,
    value: &'a SchemaVersionMetadata,
    source: S,
    block_policy: BlockPolicy,
}

impl<'a, S> RecordBatchRequest<'a, S>
where
    S: RecordBatchSource,
{
    pub fn prepare(
        key: &'a SchemaVersionMetadata,
        value: &'a SchemaVersionMetadata,
        source: S,
    ) -> Result<Self> {
        key.validate("key")?;
        value.validate("value")?;

        Ok(Self {
            key,
            value,
            source,
            block_policy: BlockPolicy::default(),
        })
    }

    pub fn with_block_policy(self, block_policy: BlockPolicy) -> Self {
        Self {
            block_policy,
            ..self
        }
    }

    pub fn key(&self) -> &SchemaVersionMetadata {
        self.key
    }

    pub fn value(&self) -> &SchemaVersionMetadata {
        self.value
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Stream the record set into `sink`, returning the number of bytes written.
    ///
    /// The sink is neither flushed nor closed. On error the sink holds a
    /// partial record set that must be discarded.
    #[instrument(skip_all, fields(source_id = self.source.source_id()))]
    pub fn write_to_sink<W>(&mut self, sink: &mut W) -> Result<u64>
    where
        W: Write,
    {
        let declared = self.source.len();
        let project_id = self.source.project_id().map(str::to_owned);
        let user_id = self.source.user_id().map(str::to_owned);
        let source_id = self.source.source_id().to_owned();

        debug!(
            key_version = self.key.version(),
            value_version = self.value.version(),
            ?project_id,
            ?user_id,
            declared
        );

        let values = self.source.values()?;

        let mut encoder = Encoder::new(sink);
        encoder.write_int(self.key.version())?;
        encoder.write_int(self.value.version())?;
        encoder.write_nullable_string(project_id.as_deref())?;
        encoder.write_nullable_string(user_id.as_deref())?;
        encoder.write_string(&source_id)?;

        let written = write_blocked_array(&mut encoder, declared, values, self.block_policy)?;

        debug!(written, bytes = encoder.bytes_written());
        Ok(encoder.bytes_written())
    }

    pub fn to_bytes(&mut self) -> Result<Bytes> {
        let mut writer = BytesMut::new().writer();
        _ = self.write_to_sink(&mut writer)?;
        Ok(writer.into_inner().freeze())
    }
}
