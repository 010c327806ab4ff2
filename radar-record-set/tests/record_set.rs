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

use std::{
    io::{self, Read, Write},
    num::NonZeroUsize,
};

use apache_avro::{from_avro_datum, schema::Schema as AvroSchema, types::Value};
use bytes::Bytes;
use common::{
    BLOOD_VOLUME_PULSE, PHONE_ACCELERATION, RECORD_SET, acceleration, init_tracing, reference,
    schema,
};
use flate2::read::GzDecoder;
use pretty_assertions::assert_eq;
use radar_record_set::{
    AvroRecordData, BlockPolicy, Error, ObservationKey, OneShot, RecordBatchRequest,
    RecordBatchSource, Result, SchemaVersionMetadata, Topic, Values, compression,
};

pub mod common;

const EXPECTED: [u8; 29] = [
    2, // key version x2
    4, // value version x2
    0, // null project ID
    0, // null user ID
    2, b'b', // string length x2, sourceId
    2,  // number of records x2
    40, // number of bytes in the first value x2
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // value
    0, // end of array
];

fn metadata() -> Result<(SchemaVersionMetadata, SchemaVersionMetadata)> {
    Ok((
        SchemaVersionMetadata::new(2, 1, ObservationKey::schema()?),
        SchemaVersionMetadata::new(4, 2, schema(BLOOD_VOLUME_PULSE)?),
    ))
}

fn blobs(data: &[Vec<u8>]) -> OneShot<std::vec::IntoIter<Result<Bytes>>> {
    OneShot::new(
        "b",
        data.iter()
            .cloned()
            .map(|blob| Ok(Bytes::from(blob)))
            .collect::<Vec<_>>(),
    )
}

#[test]
fn write_to_stream() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let topic = Topic::sensor("t", key.schema().clone(), value.schema().clone())?;

    let pulse = Value::Record(vec![
        ("time".into(), Value::Double(0.0)),
        ("timeReceived".into(), Value::Double(0.0)),
        ("bloodVolumePulse".into(), Value::Float(0.0)),
    ]);

    let data = AvroRecordData::new(
        ObservationKey::new(Some("test".into()), "a", "b"),
        value.schema().clone(),
        vec![pulse],
    );

    let mut request = topic.prepare(&key, &value, data)?;
    let mut buffer = Vec::new();
    assert_eq!(29, request.write_to_sink(&mut buffer)?);
    assert_eq!(&EXPECTED[..], &buffer[..]);

    Ok(())
}

#[test]
fn expected_matches_record_set() -> Result<()> {
    let _guard = init_tracing()?;

    assert_eq!(
        EXPECTED.to_vec(),
        reference(1, 2, None, None, "b", &[vec![0; 20]])?
    );

    Ok(())
}

#[test]
fn one_shot_matches_reference() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let data = vec![vec![0; 20]];

    let mut request = RecordBatchRequest::prepare(&key, &value, blobs(&data))?;
    assert_eq!(Bytes::from_static(&EXPECTED), request.to_bytes()?);

    Ok(())
}

#[test]
fn identifiers_sent() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let data = vec![vec![1, 2, 3], vec![], vec![4]];

    let source = blobs(&data)
        .with_project_id(Some("radar-test".into()))
        .with_user_id(Some("".into()));

    let mut request = RecordBatchRequest::prepare(&key, &value, source)?;

    assert_eq!(
        reference(1, 2, Some("radar-test"), Some(""), "b", &data)?,
        request.to_bytes()?.to_vec()
    );

    Ok(())
}

#[test]
fn empty_batch() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let mut request = RecordBatchRequest::prepare(&key, &value, blobs(&[]))?;
    let encoded = request.to_bytes()?;

    assert_eq!(&[2, 4, 0, 0, 2, b'b', 0, 0][..], &encoded[..]);

    let mut reader = &encoded[..];
    let decoded = from_avro_datum(&schema(RECORD_SET)?, &mut reader, None)?;

    let Value::Record(fields) = decoded else {
        panic!("not a record: {decoded:?}");
    };
    assert_eq!(
        Some(&Value::Array(vec![])),
        fields
            .iter()
            .find(|(name, _)| name == "data")
            .map(|(_, value)| value)
    );

    Ok(())
}

#[test]
fn multi_block_decodes_as_single() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let data = (0..10u8).map(|i| vec![i; usize::from(i)]).collect::<Vec<_>>();

    let mut request = RecordBatchRequest::prepare(&key, &value, blobs(&data))?
        .with_block_policy(BlockPolicy::MaxItems(NonZeroUsize::new(3).unwrap()));
    let encoded = request.to_bytes()?;

    let expected = reference(1, 2, None, None, "b", &data)?;
    assert_ne!(expected, encoded.to_vec());

    let record_set = schema(RECORD_SET)?;
    assert_eq!(
        from_avro_datum(&record_set, &mut &expected[..], None)?,
        from_avro_datum(&record_set, &mut &encoded[..], None)?,
    );

    Ok(())
}

#[test]
fn invalid_metadata() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, _) = metadata()?;
    let value = SchemaVersionMetadata::new(4, -2, schema(BLOOD_VOLUME_PULSE)?);

    assert!(matches!(
        RecordBatchRequest::prepare(&key, &value, blobs(&[])),
        Err(Error::InvalidMetadata(_))
    ));

    Ok(())
}

#[test]
fn metadata_of_another_topic() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let topic = Topic::sensor(
        "android_phone_acceleration",
        key.schema().clone(),
        schema(PHONE_ACCELERATION)?,
    )?;

    assert!(matches!(
        topic.prepare(&key, &value, blobs(&[])),
        Err(Error::InvalidState(_))
    ));

    Ok(())
}

#[test]
fn one_shot_source_written_once() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let mut request = RecordBatchRequest::prepare(&key, &value, blobs(&[vec![0; 20]]))?;

    let mut first = Vec::new();
    _ = request.write_to_sink(&mut first)?;
    assert_eq!(&EXPECTED[..], &first[..]);

    let mut second = Vec::new();
    assert!(matches!(
        request.write_to_sink(&mut second),
        Err(Error::SourceExhausted)
    ));
    assert!(second.is_empty());

    Ok(())
}

/// A source that replays its values on every drain.
#[derive(Clone, Debug)]
struct Replay {
    source_id: String,
    values: Vec<Bytes>,
}

impl RecordBatchSource for Replay {
    fn project_id(&self) -> Option<&str> {
        None
    }

    fn user_id(&self) -> Option<&str> {
        None
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn values(&mut self) -> Result<Values<'_>> {
        Ok(Box::new(self.values.iter().cloned().map(Ok::<_, Error>)))
    }
}

#[test]
fn replayed_source_is_deterministic() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let source = Replay {
        source_id: "596740ca-5875-4c97-87ab-a08405f36aff".into(),
        values: vec![Bytes::from_static(b"abc"), Bytes::from_static(b"def")],
    };

    let mut request = RecordBatchRequest::prepare(&key, &value, source)?;
    assert_eq!(request.to_bytes()?, request.to_bytes()?);

    Ok(())
}

#[derive(Debug)]
struct FailAfter {
    remaining: usize,
    written: Vec<u8>,
}

impl Write for FailAfter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.remaining {
            return Err(io::Error::from(io::ErrorKind::ConnectionReset));
        }

        self.remaining -= buf.len();
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_failure_leaves_partial_write() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let mut request = RecordBatchRequest::prepare(&key, &value, blobs(&[vec![0; 20]]))?;

    let mut sink = FailAfter {
        remaining: 10,
        written: Vec::new(),
    };

    assert!(matches!(
        request.write_to_sink(&mut sink),
        Err(Error::SinkWrite(error)) if error.kind() == io::ErrorKind::ConnectionReset
    ));
    assert_eq!(&EXPECTED[..8], &sink.written[..]);

    Ok(())
}

#[test]
fn source_failure_aborts() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let source = OneShot::new(
        "b",
        vec![
            Ok(Bytes::from_static(b"a")),
            Err(Error::Message(String::from("battery died"))),
        ],
    );

    let mut request = RecordBatchRequest::prepare(&key, &value, source)?;
    assert!(matches!(
        request.to_bytes(),
        Err(Error::Source(error)) if matches!(*error, Error::Message(_))
    ));

    Ok(())
}

#[test]
fn gzip() -> Result<()> {
    let _guard = init_tracing()?;

    let (key, value) = metadata()?;
    let value_schema: &AvroSchema = value.schema();
    let records = (0..100i32)
        .map(|i| {
            let time = f64::from(i);
            Value::Record(vec![
                ("time".into(), Value::Double(time)),
                ("timeReceived".into(), Value::Double(time + 1.0)),
                ("bloodVolumePulse".into(), Value::Float(60.0)),
            ])
        })
        .collect::<Vec<_>>();

    let key_value = ObservationKey::new(None, "a", "b");

    let expected = RecordBatchRequest::prepare(
        &key,
        &value,
        AvroRecordData::new(key_value.clone(), value_schema.clone(), records.clone()),
    )?
    .to_bytes()?;

    let compressed = compression::gzip(&mut RecordBatchRequest::prepare(
        &key,
        &value,
        AvroRecordData::new(key_value, value_schema.clone(), records),
    )?)?;

    assert!(compressed.len() < expected.len());

    let mut decompressed = Vec::new();
    _ = GzDecoder::new(&compressed[..])
        .read_to_end(&mut decompressed)
        .map_err(|err| Error::Message(err.to_string()))?;

    assert_eq!(expected.to_vec(), decompressed);
    Ok(())
}

#[test]
fn phone_acceleration_record_set() -> Result<()> {
    let _guard = init_tracing()?;

    let value_schema = schema(PHONE_ACCELERATION)?;
    let key = SchemaVersionMetadata::new(2, 1, ObservationKey::schema()?);
    let value = SchemaVersionMetadata::new(5, 3, value_schema.clone());

    let records = (0..25)
        .map(|i| acceleration(&value_schema, i))
        .collect::<Result<Vec<_>>>()?;

    let data = records
        .iter()
        .map(|record| apache_avro::to_avro_datum(&value_schema, record.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut request = RecordBatchRequest::prepare(
        &key,
        &value,
        AvroRecordData::new(
            ObservationKey::new(Some("radar".into()), "u", "s"),
            value_schema,
            records,
        )
        .with_identifiers(true),
    )?;

    assert_eq!(
        reference(1, 3, Some("radar"), Some("u"), "s", &data)?,
        request.to_bytes()?.to_vec()
    );

    Ok(())
}

#[test]
fn published_record_set_schema() -> Result<()> {
    let _guard = init_tracing()?;

    assert_eq!(schema(RECORD_SET)?, radar_record_set::record_set_schema()?);

    let encoded = blobs(&[vec![1, 2, 3]]);
    let (key, value) = metadata()?;
    let encoded = RecordBatchRequest::prepare(&key, &value, encoded)?.to_bytes()?;

    let decoded = from_avro_datum(
        &radar_record_set::record_set_schema()?,
        &mut &encoded[..],
        None,
    )?;

    let Value::Record(fields) = decoded else {
        panic!("not a record");
    };

    assert_eq!(
        ("data".into(), Value::Array(vec![Value::Bytes(vec![1, 2, 3])])),
        fields[5]
    );

    Ok(())
}
