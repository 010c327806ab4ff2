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

//! Topics and the schemas of their keys and values.

use apache_avro::schema::{RecordSchema, Schema as AvroSchema};
use tracing::debug;

use crate::{
    Error, Result, metadata::SchemaVersionMetadata, request::RecordBatchRequest,
    source::RecordBatchSource,
};

#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
enum MessageKind {
    Key,
    Value,
}

impl AsRef<str> for MessageKind {
    fn as_ref(&self) -> &str {
        match self {
            MessageKind::Key => "key",
            MessageKind::Value => "value",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Topic {
    name: String,
    key: AvroSchema,
    value: AvroSchema,
}

fn record<'a>(kind: MessageKind, schema: &'a AvroSchema) -> Result<&'a RecordSchema> {
    if let AvroSchema::Record(record) = schema {
        Ok(record)
    } else {
        Err(Error::InvalidTopic(format!(
            "sensors must send records as {}s",
            kind.as_ref()
        )))
    }
}

fn require(kind: MessageKind, record: &RecordSchema, field: &str) -> Result<()> {
    if record.lookup.contains_key(field) {
        Ok(())
    } else {
        Err(Error::InvalidTopic(format!(
            "{} schema must have a {field} field",
            kind.as_ref()
        )))
    }
}

impl Topic {
    pub fn new(name: impl Into<String>, key: AvroSchema, value: AvroSchema) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::InvalidTopic(String::from("topic without a name")));
        }

        Ok(Self { name, key, value })
    }

    /// A topic of measurements from a sensor.
    ///
    /// The key identifies the user and the source device, and every value
    /// carries the time of the measurement and the time it was received.
    pub fn sensor(name: impl Into<String>, key: AvroSchema, value: AvroSchema) -> Result<Self> {
        let topic = Self::new(name, key, value)?;

        record(MessageKind::Key, &topic.key).and_then(|key| {
            require(MessageKind::Key, key, "userId")
                .and(require(MessageKind::Key, key, "sourceId"))
        })?;

        record(MessageKind::Value, &topic.value).and_then(|value| {
            require(MessageKind::Value, value, "time")
                .and(require(MessageKind::Value, value, "timeReceived"))
        })?;

        Ok(topic)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &AvroSchema {
        &self.key
    }

    pub fn value(&self) -> &AvroSchema {
        &self.value
    }

    /// Prepare a record set for this topic.
    ///
    /// The metadata must describe the key and value schemas of this topic.
    pub fn prepare<'a, S>(
        &self,
        key: &'a SchemaVersionMetadata,
        value: &'a SchemaVersionMetadata,
        source: S,
    ) -> Result<RecordBatchRequest<'a, S>>
    where
        S: RecordBatchSource,
    {
        for (kind, expected, metadata) in [
            (MessageKind::Key, &self.key, key),
            (MessageKind::Value, &self.value, value),
        ] {
            if metadata.schema() != expected {
                debug!(topic = %self.name, kind = kind.as_ref(), id = metadata.id());

                return Err(Error::InvalidState(format!(
                    "{} schema {} (version {}) is not the {} schema of {}",
                    kind.as_ref(),
                    metadata.id(),
                    metadata.version(),
                    kind.as_ref(),
                    self.name
                )));
            }
        }

        RecordBatchRequest::prepare(key, value, source)
    }
}
