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

//! Avro values encoded on demand.

use apache_avro::{schema::Schema as AvroSchema, to_avro_datum, types::Value};
use bytes::Bytes;
use tracing::debug;

use super::{RecordBatchSource, Values};
use crate::{Error, Result};

const PROJECT_ID: &str = "projectId";
const USER_ID: &str = "userId";
const SOURCE_ID: &str = "sourceId";

pub const OBSERVATION_KEY_SCHEMA: &str = r#"{
  "namespace": "org.radarcns.kafka",
  "type": "record",
  "name": "ObservationKey",
  "doc": "Key of an observation.",
  "fields": [
    {"name": "projectId", "type": ["null", "string"], "doc": "Project identifier. Null if unknown or the user is not enrolled in a project.", "default": null},
    {"name": "userId", "type": "string", "doc": "User Identifier created during the enrolment."},
    {"name": "sourceId", "type": "string", "doc": "Unique identifier associated with the source."}
  ]
}"#;

/// The key of every measurement taken by a source device.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObservationKey {
    pub project_id: Option<String>,
    pub user_id: String,
    pub source_id: String,
}

impl ObservationKey {
    pub fn new(
        project_id: Option<String>,
        user_id: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            user_id: user_id.into(),
            source_id: source_id.into(),
        }
    }

    pub fn schema() -> Result<AvroSchema> {
        AvroSchema::parse_str(OBSERVATION_KEY_SCHEMA).map_err(Into::into)
    }
}

fn string(fields: &[(String, Value)], name: &str) -> Result<Option<String>> {
    fn inner(name: &str, value: &Value) -> Result<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            Value::Union(_, value) => inner(name, value),
            otherwise => Err(Error::Message(format!("{name}: {otherwise:?}"))),
        }
    }

    fields
        .iter()
        .find(|(field, _)| field == name)
        .map_or(Ok(None), |(_, value)| inner(name, value))
}

impl TryFrom<&Value> for ObservationKey {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let Value::Record(fields) = value else {
            return Err(Error::Message(format!("key is not a record: {value:?}")));
        };

        let required = |name: &str| {
            string(fields, name)?.ok_or_else(|| Error::Message(format!("key without {name}")))
        };

        Ok(Self {
            project_id: string(fields, PROJECT_ID)?,
            user_id: required(USER_ID)?,
            source_id: required(SOURCE_ID)?,
        })
    }
}

impl From<ObservationKey> for Value {
    fn from(key: ObservationKey) -> Self {
        Value::Record(vec![
            (
                PROJECT_ID.into(),
                key.project_id.map_or(Value::Union(0, Box::new(Value::Null)), |project_id| {
                    Value::Union(1, Box::new(Value::String(project_id)))
                }),
            ),
            (USER_ID.into(), Value::String(key.user_id)),
            (SOURCE_ID.into(), Value::String(key.source_id)),
        ])
    }
}

/// Measurements of one key, Avro encoded one at a time as they are written.
///
/// The project and user are not sent unless asked for: the ingestion
/// endpoint takes them from the credentials of the client.
#[derive(Clone, Debug)]
pub struct AvroRecordData<I> {
    key: ObservationKey,
    schema: AvroSchema,
    identifiers: bool,
    len: usize,
    values: Option<I>,
}

impl<I> AvroRecordData<I>
where
    I: Iterator<Item = Value>,
{
    pub fn new<T>(key: ObservationKey, schema: AvroSchema, values: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
        I: ExactSizeIterator,
    {
        let values = values.into_iter();
        Self::with_len(key, schema, values.len(), values)
    }

    pub fn with_len<T>(key: ObservationKey, schema: AvroSchema, len: usize, values: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            key,
            schema,
            identifiers: false,
            len,
            values: Some(values.into_iter()),
        }
    }

    /// Send the project and user of the key with the record set.
    pub fn with_identifiers(self, identifiers: bool) -> Self {
        Self {
            identifiers,
            ..self
        }
    }

    pub fn key(&self) -> &ObservationKey {
        &self.key
    }

    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }
}

impl<I> RecordBatchSource for AvroRecordData<I>
where
    I: Iterator<Item = Value>,
{
    fn project_id(&self) -> Option<&str> {
        self.key
            .project_id
            .as_deref()
            .filter(|_| self.identifiers)
    }

    fn user_id(&self) -> Option<&str> {
        Some(self.key.user_id.as_str()).filter(|_| self.identifiers)
    }

    fn source_id(&self) -> &str {
        &self.key.source_id
    }

    fn len(&self) -> usize {
        if self.values.is_some() { self.len } else { 0 }
    }

    fn values(&mut self) -> Result<Values<'_>> {
        let values = self.values.take().ok_or(Error::SourceExhausted)?;
        let schema = &self.schema;

        debug!(source_id = %self.key.source_id, len = self.len);

        Ok(Box::new(values.map(move |value| {
            to_avro_datum(schema, value)
                .map(Bytes::from)
                .map_err(Into::into)
        })))
    }
}

#[cfg(test)]
mod tests {
    use apache_avro::{from_avro_datum, types::Record};

    use super::*;

    fn blood_volume_pulse() -> Result<AvroSchema> {
        AvroSchema::parse_str(
            r#"{
              "namespace": "org.radarcns.passive.empatica",
              "type": "record",
              "name": "EmpaticaE4BloodVolumePulse",
              "fields": [
                {"name": "time", "type": "double"},
                {"name": "timeReceived", "type": "double"},
                {"name": "bloodVolumePulse", "type": "float"}
              ]
            }"#,
        )
        .map_err(Into::into)
    }

    fn pulse(schema: &AvroSchema, time: f64) -> Result<Value> {
        let mut record = Record::new(schema).ok_or(Error::Message("not a record".into()))?;
        record.put("time", time);
        record.put("timeReceived", time + 0.5);
        record.put("bloodVolumePulse", 72.0f32);
        Ok(record.into())
    }

    #[test]
    fn key_round_trip() -> Result<()> {
        let key = ObservationKey::new(Some("radar".into()), "a", "b");
        let schema = ObservationKey::schema()?;

        let encoded = to_avro_datum(&schema, Value::from(key.clone()))?;
        let decoded = from_avro_datum(&schema, &mut &encoded[..], None)?;

        assert_eq!(key, ObservationKey::try_from(&decoded)?);
        Ok(())
    }

    #[test]
    fn key_without_source() {
        let value = Value::Record(vec![(USER_ID.into(), Value::String("a".into()))]);

        assert!(matches!(
            ObservationKey::try_from(&value),
            Err(Error::Message(message)) if message == "key without sourceId"
        ));
    }

    #[test]
    fn identifiers_withheld_by_default() -> Result<()> {
        let key = ObservationKey::new(Some("test".into()), "a", "b");
        let data = AvroRecordData::new(key.clone(), blood_volume_pulse()?, Vec::<Value>::new());

        assert_eq!(None, data.project_id());
        assert_eq!(None, data.user_id());
        assert_eq!("b", data.source_id());

        let data = data.with_identifiers(true);
        assert_eq!(Some("test"), data.project_id());
        assert_eq!(Some("a"), data.user_id());

        Ok(())
    }

    #[test]
    fn values_encoded_in_order() -> Result<()> {
        let schema = blood_volume_pulse()?;
        let values = vec![pulse(&schema, 1.0)?, pulse(&schema, 2.0)?];
        let expected = values
            .iter()
            .map(|value| to_avro_datum(&schema, value.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut data = AvroRecordData::new(ObservationKey::new(None, "a", "b"), schema, values);
        assert_eq!(2, data.len());

        let encoded = data
            .values()?
            .map(|value| value.map(|value| value.to_vec()))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(expected, encoded);
        assert!(matches!(data.values(), Err(Error::SourceExhausted)));
        Ok(())
    }

    #[test]
    fn invalid_value() -> Result<()> {
        let mut data = AvroRecordData::new(
            ObservationKey::new(None, "a", "b"),
            blood_volume_pulse()?,
            vec![Value::String("not a pulse".into())],
        );

        let mut values = data.values()?;
        assert!(matches!(values.next(), Some(Err(Error::Avro(_)))));
        Ok(())
    }
}
