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

//! Batch sources: the values of one record set, from one source device.

use bytes::Bytes;

use crate::{Error, Result};

mod avro;

pub use avro::{AvroRecordData, OBSERVATION_KEY_SCHEMA, ObservationKey};

/// Lazily produced, pre-encoded values.
pub type Values<'a> = Box<dyn Iterator<Item = Result<Bytes>> + 'a>;

/// The identifiers and values of a record set.
///
/// Values are drawn once per write, in order, and are never collected by the
/// encoder. A source that cannot replay its values fails any later drain
/// with [`Error::SourceExhausted`].
pub trait RecordBatchSource {
    fn project_id(&self) -> Option<&str>;

    fn user_id(&self) -> Option<&str>;

    fn source_id(&self) -> &str;

    /// The number of values the next drain produces.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn values(&mut self) -> Result<Values<'_>>;
}

impl<S> RecordBatchSource for &mut S
where
    S: RecordBatchSource + ?Sized,
{
    fn project_id(&self) -> Option<&str> {
        (**self).project_id()
    }

    fn user_id(&self) -> Option<&str> {
        (**self).user_id()
    }

    fn source_id(&self) -> &str {
        (**self).source_id()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn values(&mut self) -> Result<Values<'_>> {
        (**self).values()
    }
}

/// Identifiers with a single use iterator of pre-encoded values.
#[derive(Clone, Debug)]
pub struct OneShot<I> {
    project_id: Option<String>,
    user_id: Option<String>,
    source_id: String,
    len: usize,
    values: Option<I>,
}

impl<I> OneShot<I>
where
    I: Iterator<Item = Result<Bytes>>,
{
    pub fn new<T>(source_id: impl Into<String>, values: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
        I: ExactSizeIterator,
    {
        let values = values.into_iter();
        Self::with_len(source_id, values.len(), values)
    }

    /// Values from an iterator that does not know its own length.
    pub fn with_len<T>(source_id: impl Into<String>, len: usize, values: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            project_id: None,
            user_id: None,
            source_id: source_id.into(),
            len,
            values: Some(values.into_iter()),
        }
    }

    pub fn with_project_id(self, project_id: Option<String>) -> Self {
        Self { project_id, ..self }
    }

    pub fn with_user_id(self, user_id: Option<String>) -> Self {
        Self { user_id, ..self }
    }
}

impl<I> RecordBatchSource for OneShot<I>
where
    I: Iterator<Item = Result<Bytes>>,
{
    fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn len(&self) -> usize {
        if self.values.is_some() { self.len } else { 0 }
    }

    fn values(&mut self) -> Result<Values<'_>> {
        self.values
            .take()
            .map(|values| Box::new(values) as Values<'_>)
            .ok_or(Error::SourceExhausted)
    }
}
