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
    cell::Cell,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use super::log_statistics;
use crate::{EnvVarExp, Result};
use clap::Args;
use radar_mock::{Sensor, SensorCollector, generator::USER_ID, reader};
use radar_record_set::{
    AvroRecordData, BlockPolicy, ObservationKey, SchemaVersionMetadata, compression,
};
use tracing::{debug, info};

#[derive(Args, Clone, Debug)]
pub(super) struct Arg {
    /// The sensor that took the readings
    #[arg(long, env = "RADAR_SENSOR")]
    sensor: EnvVarExp<Sensor>,

    /// The CSV file of readings, or - for stdin
    #[arg(long, default_value = "-")]
    input: EnvVarExp<PathBuf>,

    /// The record set file to write [default: stdout]
    #[arg(long)]
    output: Option<EnvVarExp<PathBuf>>,

    #[arg(long, default_value = "1", env = "RADAR_KEY_SCHEMA_ID")]
    key_schema_id: i32,

    #[arg(long, default_value = "1", env = "RADAR_KEY_SCHEMA_VERSION")]
    key_schema_version: i32,

    #[arg(long, default_value = "2", env = "RADAR_VALUE_SCHEMA_ID")]
    value_schema_id: i32,

    #[arg(long, default_value = "1", env = "RADAR_VALUE_SCHEMA_VERSION")]
    value_schema_version: i32,

    /// Sent with the record set when given
    #[arg(long, env = "RADAR_PROJECT_ID")]
    project_id: Option<String>,

    /// Sent with the record set when given
    #[arg(long, env = "RADAR_USER_ID")]
    user_id: Option<String>,

    #[arg(long, env = "RADAR_SOURCE_ID")]
    source_id: String,

    /// Compress the record set with gzip
    #[arg(long)]
    gzip: bool,

    /// Split the values into blocks of at most this many items
    #[arg(long)]
    block_size: Option<NonZeroUsize>,
}

/// Counts the bytes passing through to the writer.
#[derive(Debug)]
struct Counter<W> {
    inner: W,
    count: u64,
}

impl<W> Write for Counter<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).inspect(|written| {
            self.count += *written as u64;
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// The readings, from the buffered stdin when given, otherwise from the file.
fn open<'a>(input: &Path, buffered: Option<&'a [u8]>) -> Result<Box<dyn Read + 'a>> {
    if let Some(buffered) = buffered {
        Ok(Box::new(buffered))
    } else {
        Ok(Box::new(File::open(input).map(BufReader::new)?))
    }
}

impl Arg {
    pub(super) fn main(self) -> Result<u64> {
        let sensor = self.sensor.into_inner();
        let topic = sensor.topic()?;

        let input = self.input.into_inner();
        debug!(%sensor, input = %input.display());

        // stdin can only be read once
        let stdin = if input.as_os_str() == "-" {
            let mut buffer = Vec::new();
            _ = io::stdin().lock().read_to_end(&mut buffer)?;
            Some(buffer)
        } else {
            None
        };

        let records = usize::try_from(reader::count(open(&input, stdin.as_deref())?)?)?;
        debug!(records);

        let key = SchemaVersionMetadata::new(
            self.key_schema_id,
            self.key_schema_version,
            topic.key().clone(),
        );

        let value = SchemaVersionMetadata::new(
            self.value_schema_id,
            self.value_schema_version,
            topic.value().clone(),
        );

        let identifiers = self.project_id.is_some() || self.user_id.is_some();

        let failed = Cell::new(None);
        let mut collector = SensorCollector::new(sensor);

        let written = {
            let values = reader::records(sensor, open(&input, stdin.as_deref())?)?
                .map_while(|value| match value {
                    Ok(value) => Some(value),
                    Err(error) => {
                        failed.set(Some(error));
                        None
                    }
                })
                .inspect(|value| collector.add_value(value));

            let data = AvroRecordData::with_len(
                ObservationKey::new(
                    self.project_id,
                    self.user_id.unwrap_or_else(|| USER_ID.into()),
                    self.source_id,
                ),
                topic.value().clone(),
                records,
                values,
            )
            .with_identifiers(identifiers);

            let mut request = topic.prepare(&key, &value, data)?.with_block_policy(
                self.block_size
                    .map_or(BlockPolicy::Single, BlockPolicy::MaxItems),
            );

            let writer: Box<dyn Write> =
                if let Some(output) = self.output.map(EnvVarExp::into_inner) {
                    Box::new(File::create(output).map(BufWriter::new)?)
                } else {
                    Box::new(io::stdout().lock())
                };

            let mut sink = Counter {
                inner: writer,
                count: 0,
            };

            let encoded = if self.gzip {
                compression::gzip_into(&mut request, &mut sink).map(|(encoded, _)| encoded)
            } else {
                request.write_to_sink(&mut sink)
            };

            // a row that failed to parse ends the values early
            if let Some(error) = failed.take() {
                return Err(error.into());
            }

            let encoded = encoded?;
            sink.flush()?;

            if self.gzip {
                info!(%sensor, records, encoded, compressed = sink.count);
            } else {
                info!(%sensor, records, encoded);
            }

            sink.count
        };

        log_statistics(&collector);
        Ok(written)
    }
}
