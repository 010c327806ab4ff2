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

//! Record set encoding.
//!
//! A record set is a batch of Avro encoded sensor measurements from a single
//! source, sent in one message to a schema registry backed ingestion
//! endpoint. The message is the Avro binary encoding of:
//!
//! ```json
//! {
//!   "type": "record",
//!   "name": "RecordSet",
//!   "namespace": "org.radarcns.kafka",
//!   "fields": [
//!     {"name": "keySchemaVersion", "type": "int"},
//!     {"name": "valueSchemaVersion", "type": "int"},
//!     {"name": "projectId", "type": ["null", "string"], "default": null},
//!     {"name": "userId", "type": ["null", "string"], "default": null},
//!     {"name": "sourceId", "type": "string"},
//!     {"name": "data", "type": {"type": "array", "items": "bytes"}}
//!   ]
//! }
//! ```
//!
//! The envelope is written directly to a sink while the values are drawn
//! from the batch source, one at a time, without building the whole record
//! set in memory.

use std::{fmt, io, result, sync::Arc};

use apache_avro::schema::Schema as AvroSchema;

pub mod array;
pub mod compression;
pub mod metadata;
pub mod primitive;
pub mod request;
pub mod source;
pub mod topic;

pub use array::BlockPolicy;
pub use metadata::SchemaVersionMetadata;
pub use request::RecordBatchRequest;
pub use source::{
    AvroRecordData, OBSERVATION_KEY_SCHEMA, ObservationKey, OneShot, RecordBatchSource, Values,
};
pub use topic::Topic;

pub const RECORD_SET_SCHEMA: &str = r#"{
  "namespace": "org.radarcns.kafka",
  "type": "record",
  "name": "RecordSet",
  "fields": [
    {"name": "keySchemaVersion", "type": "int"},
    {"name": "valueSchemaVersion", "type": "int"},
    {"name": "projectId", "type": ["null", "string"], "default": null},
    {"name": "userId", "type": ["null", "string"], "default": null},
    {"name": "sourceId", "type": "string"},
    {"name": "data", "type": {"type": "array", "items": "bytes"}}
  ]
}"#;

/// The schema of an encoded record set, for decoding with a generic reader.
pub fn record_set_schema() -> Result<AvroSchema> {
    AvroSchema::parse_str(RECORD_SET_SCHEMA).map_err(Into::into)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    Avro(Box<apache_avro::Error>),

    /// Schema version metadata that cannot be sent.
    InvalidMetadata(String),

    /// Metadata that does not belong to the topic of the request.
    InvalidState(String),

    InvalidTopic(String),

    /// A string, blob or array too long for an Avro length.
    LengthOverflow(usize),

    Message(String),

    /// Writing to the sink failed, leaving it partially written.
    SinkWrite(Arc<io::Error>),

    /// The batch source failed while its values were being written.
    Source(Box<Error>),

    /// The values of a one shot batch source have already been drained.
    SourceExhausted,

    /// The batch source produced a different number of values than it declared.
    SourceLengthMismatch { declared: usize, produced: usize },
}

impl Error {
    pub(crate) fn sink_write(error: io::Error) -> Self {
        Self::SinkWrite(Arc::new(error))
    }
}

impl From<apache_avro::Error> for Error {
    fn from(value: apache_avro::Error) -> Self {
        Self::Avro(Box::new(value))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "{msg}"),
            error => write!(f, "{error:?}"),
        }
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;
