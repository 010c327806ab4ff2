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

//! Readings read back from CSV as Avro values.

use std::io::Read;

use apache_avro::types::Value;
use csv::StringRecord;
use tracing::debug;

use crate::{Error, Result, generator::header, sensor::Sensor};

fn parse_row(sensor: Sensor, record: &StringRecord) -> Result<Value> {
    let columns = header(sensor);

    if record.len() != columns.len() {
        return Err(Error::Row {
            line: record.position().map_or(0, |position| position.line()),
            columns: record.len(),
        });
    }

    let time = record[2].trim().parse::<f64>()?;
    let time_received = record[3].trim().parse::<f64>()?;

    let mut fields = vec![
        ("time".into(), Value::Double(time)),
        ("timeReceived".into(), Value::Double(time_received)),
    ];

    for (name, column) in sensor.fields().iter().zip(record.iter().skip(4)) {
        fields.push(((*name).into(), Value::Float(column.trim().parse::<f32>()?)));
    }

    Ok(Value::Record(fields))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}

/// The number of rows following the header, without parsing them.
pub fn count<R>(reader: R) -> Result<u64>
where
    R: Read,
{
    let mut csv = csv_reader(reader);
    let mut record = csv::ByteRecord::new();
    let mut rows = 0;

    while csv.read_byte_record(&mut record)? {
        rows += 1;
    }

    debug!(rows);
    Ok(rows)
}

/// Lazily parse each CSV row into a value of the sensor's value schema.
///
/// The header is checked before the first row is read.
pub fn records<R>(sensor: Sensor, reader: R) -> Result<impl Iterator<Item = Result<Value>>>
where
    R: Read,
{
    let mut csv = csv_reader(reader);

    let expected = header(sensor);
    let found = csv
        .headers()?
        .iter()
        .map(|column| column.trim().to_owned())
        .collect::<Vec<_>>();

    if found != expected {
        debug!(?expected, ?found);
        return Err(Error::Header { expected, found });
    }

    Ok(csv.into_records().map(move |record| {
        record
            .map_err(Into::into)
            .and_then(|record| parse_row(sensor, &record))
    }))
}
