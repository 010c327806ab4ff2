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
    io::Write,
    marker::PhantomData,
    num::NonZeroU32,
    time::{SystemTime, UNIX_EPOCH},
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, instrument};

use crate::{
    Error, Result,
    collector::SensorCollector,
    sensor::{Readings, Sensor},
};

pub const USER_ID: &str = "UserID_0";
pub const SOURCE_ID: &str = "SourceID_0";

/// The CSV columns of a sensor: identifiers, times then its readings.
pub fn header(sensor: Sensor) -> Vec<String> {
    ["userId", "sourceId", "time", "timeReceived"]
        .into_iter()
        .chain(sensor.fields().iter().copied())
        .map(String::from)
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct Builder<S, D, F> {
    sensor: S,
    duration: D,
    frequency: F,
    user_id: Option<String>,
    source_id: Option<String>,
    time_zero: Option<f64>,
    seed: Option<u64>,
}

pub type PhantomBuilder =
    Builder<PhantomData<Sensor>, PhantomData<u64>, PhantomData<NonZeroU32>>;

impl<S, D, F> Builder<S, D, F> {
    pub fn sensor(self, sensor: Sensor) -> Builder<Sensor, D, F> {
        Builder {
            sensor,
            duration: self.duration,
            frequency: self.frequency,
            user_id: self.user_id,
            source_id: self.source_id,
            time_zero: self.time_zero,
            seed: self.seed,
        }
    }

    /// Seconds of readings to simulate.
    pub fn duration(self, duration: u64) -> Builder<S, u64, F> {
        Builder {
            sensor: self.sensor,
            duration,
            frequency: self.frequency,
            user_id: self.user_id,
            source_id: self.source_id,
            time_zero: self.time_zero,
            seed: self.seed,
        }
    }

    /// Readings per second.
    pub fn frequency(self, frequency: NonZeroU32) -> Builder<S, D, NonZeroU32> {
        Builder {
            sensor: self.sensor,
            duration: self.duration,
            frequency,
            user_id: self.user_id,
            source_id: self.source_id,
            time_zero: self.time_zero,
            seed: self.seed,
        }
    }

    pub fn user_id(self, user_id: Option<String>) -> Self {
        Self { user_id, ..self }
    }

    pub fn source_id(self, source_id: Option<String>) -> Self {
        Self { source_id, ..self }
    }

    /// Seconds since the epoch of the first reading, defaults to now.
    pub fn time_zero(self, time_zero: Option<f64>) -> Self {
        Self { time_zero, ..self }
    }

    pub fn seed(self, seed: Option<u64>) -> Self {
        Self { seed, ..self }
    }
}

impl Builder<Sensor, u64, NonZeroU32> {
    /// Fails when the number of rows does not fit in 64 bits.
    pub fn build(self) -> Result<Generator> {
        let len = self
            .duration
            .checked_mul(u64::from(self.frequency.get()))
            .ok_or(Error::TooManyRows {
                duration: self.duration,
                frequency: self.frequency.get(),
            })?;

        let time_zero = self.time_zero.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0.0, |elapsed| elapsed.as_secs_f64())
        });

        Ok(Generator {
            sensor: self.sensor,
            len,
            frequency: self.frequency,
            user_id: self.user_id.unwrap_or_else(|| USER_ID.into()),
            source_id: self.source_id.unwrap_or_else(|| SOURCE_ID.into()),
            time_zero,
            seed: self.seed,
        })
    }
}

/// A single reading with the time it was taken and received.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub time: f64,
    pub time_received: f64,
    pub values: Vec<f32>,
}

/// Writes simulated readings of a sensor as CSV.
#[derive(Clone, Debug, PartialEq)]
pub struct Generator {
    sensor: Sensor,
    len: u64,
    frequency: NonZeroU32,
    user_id: String,
    source_id: String,
    time_zero: f64,
    seed: Option<u64>,
}

impl Generator {
    pub fn builder() -> PhantomBuilder {
        Builder::default()
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn time_zero(&self) -> f64 {
        self.time_zero
    }

    /// The number of rows: one for each reading over the duration.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Readings drawn lazily, the same readings each time when seeded.
    pub fn rows(&self) -> impl Iterator<Item = Row> + use<> {
        let rng = self
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let mut readings = Readings::new(self.sensor, rng);
        let time_zero = self.time_zero;
        let interval = 1.0 / f64::from(self.frequency.get());

        (0..self.len()).map(move |i| {
            let time = time_zero + i as f64 * interval;
            let values = readings.next_reading();
            let time_received = time + readings.rng().random_range(0.0..0.1);

            Row {
                time,
                time_received,
                values,
            }
        })
    }

    /// Write the header and every row, returning the number of rows written.
    #[instrument(skip_all, fields(sensor = %self.sensor))]
    pub fn write<W>(&self, writer: W) -> Result<u64>
    where
        W: Write,
    {
        self.write_rows(writer, |_| ())
    }

    /// Write as [`Generator::write`], adding each reading to the collector.
    #[instrument(skip_all, fields(sensor = %self.sensor))]
    pub fn write_collecting<W>(&self, writer: W, collector: &mut SensorCollector) -> Result<u64>
    where
        W: Write,
    {
        if collector.sensor() != self.sensor {
            return Err(Error::Message(format!(
                "collecting {} while writing {}",
                collector.sensor(),
                self.sensor
            )));
        }

        self.write_rows(writer, |row| collector.add_reading(&row.values))
    }

    fn write_rows<W, F>(&self, writer: W, mut inspect: F) -> Result<u64>
    where
        W: Write,
        F: FnMut(&Row),
    {
        debug!(user_id = %self.user_id, source_id = %self.source_id, len = self.len());

        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(header(self.sensor))?;

        let mut written = 0;

        for row in self.rows() {
            csv.write_record(
                [
                    self.user_id.clone(),
                    self.source_id.clone(),
                    row.time.to_string(),
                    row.time_received.to_string(),
                ]
                .into_iter()
                .chain(row.values.iter().map(f32::to_string)),
            )?;

            inspect(&row);
            written += 1;
        }

        csv.flush()?;
        debug!(written);
        Ok(written)
    }
}
