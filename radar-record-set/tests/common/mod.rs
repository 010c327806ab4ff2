#![allow(dead_code)]

use apache_avro::{
    schema::Schema as AvroSchema,
    to_avro_datum,
    types::{Record, Value},
};
use radar_record_set::{Error, Result};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_tracing() -> Result<DefaultGuard> {
    Ok(tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_level(true)
            .with_line_number(true)
            .with_thread_names(false)
            .with_target(true)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(
                    format!("{}=debug", env!("CARGO_PKG_NAME").replace("-", "_"))
                        .parse()
                        .map_err(|err| Error::Message(format!("{err}")))?,
                ),
            )
            .with_test_writer()
            .finish(),
    ))
}

pub(crate) const RECORD_SET: &str = r#"{
  "namespace": "org.radarcns.kafka",
  "type": "record",
  "name": "RecordSet",
  "doc": "Abbreviated record set, meant only for communication between a client and the REST proxy.",
  "fields": [
    {"name": "keySchemaVersion", "type": "int"},
    {"name": "valueSchemaVersion", "type": "int"},
    {"name": "projectId", "type": ["null", "string"], "default": null},
    {"name": "userId", "type": ["null", "string"], "default": null},
    {"name": "sourceId", "type": "string"},
    {"name": "data", "type": {"type": "array", "items": "bytes"}}
  ]
}"#;

pub(crate) const PHONE_ACCELERATION: &str = r#"{
  "namespace": "org.radarcns.passive.phone",
  "type": "record",
  "name": "PhoneAcceleration",
  "fields": [
    {"name": "time", "type": "double"},
    {"name": "timeReceived", "type": "double"},
    {"name": "x", "type": "float"},
    {"name": "y", "type": "float"},
    {"name": "z", "type": "float"}
  ]
}"#;

pub(crate) const BLOOD_VOLUME_PULSE: &str = r#"{
  "namespace": "org.radarcns.passive.empatica",
  "type": "record",
  "name": "EmpaticaE4BloodVolumePulse",
  "fields": [
    {"name": "time", "type": "double"},
    {"name": "timeReceived", "type": "double"},
    {"name": "bloodVolumePulse", "type": "float"}
  ]
}"#;

pub(crate) fn schema(definition: &str) -> Result<AvroSchema> {
    AvroSchema::parse_str(definition).map_err(Into::into)
}

fn nullable(s: Option<&str>) -> Value {
    s.map_or(Value::Union(0, Box::new(Value::Null)), |s| {
        Value::Union(1, Box::new(Value::String(s.into())))
    })
}

/// The record set as written by the generic Avro encoder.
pub(crate) fn reference(
    key_version: i32,
    value_version: i32,
    project_id: Option<&str>,
    user_id: Option<&str>,
    source_id: &str,
    data: &[Vec<u8>],
) -> Result<Vec<u8>> {
    let schema = schema(RECORD_SET)?;
    let mut record = Record::new(&schema).ok_or(Error::Message("not a record".into()))?;
    record.put("keySchemaVersion", Value::Int(key_version));
    record.put("valueSchemaVersion", Value::Int(value_version));
    record.put("projectId", nullable(project_id));
    record.put("userId", nullable(user_id));
    record.put("sourceId", Value::String(source_id.into()));
    record.put(
        "data",
        Value::Array(data.iter().cloned().map(Value::Bytes).collect()),
    );

    to_avro_datum(&schema, record).map_err(Into::into)
}

pub(crate) fn acceleration(schema: &AvroSchema, i: usize) -> Result<Value> {
    let time = 1_500_000_000.0 + i as f64 * 0.02;

    let mut record = Record::new(schema).ok_or(Error::Message("not a record".into()))?;
    record.put("time", time);
    record.put("timeReceived", time + 0.1);
    record.put("x", (i % 7) as f32 * 0.25);
    record.put("y", -((i % 5) as f32) * 0.5);
    record.put("z", 9.81f32);
    Ok(record.into())
}
