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

//! Statistics of sensor readings.

use apache_avro::types::Value;
use tracing::debug;

use crate::sensor::Sensor;

mod reservoir;

pub use reservoir::{DEFAULT_MAX_SIZE, UniformSamplingReservoir, quartiles};

/// A summary of the values collected, NaN where there were none.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Statistics {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    pub quartiles: [f64; 3],
    pub iqr: f64,
}

/// Running minimum, maximum, sum and mean, with quartiles from a reservoir.
///
/// The quartiles are exact while the reservoir holds every value, and
/// estimated from a uniform sample after that.
#[derive(Clone, Debug)]
pub struct ValueCollector {
    min: f64,
    max: f64,
    sum: f64,
    compensation: f64,
    reservoir: UniformSamplingReservoir,
}

impl Default for ValueCollector {
    fn default() -> Self {
        Self::with_reservoir(UniformSamplingReservoir::default())
    }
}

impl ValueCollector {
    pub fn with_reservoir(reservoir: UniformSamplingReservoir) -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            compensation: 0.0,
            reservoir,
        }
    }

    pub fn add(&mut self, value: f64) -> &mut Self {
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        // Neumaier summation
        let sum = self.sum + value;
        self.compensation += if self.sum.abs() >= value.abs() {
            (self.sum - sum) + value
        } else {
            (value - sum) + self.sum
        };
        self.sum = sum;

        self.reservoir.add(value);
        self
    }

    pub fn count(&self) -> u64 {
        self.reservoir.count()
    }

    pub fn statistics(&self) -> Statistics {
        let count = self.count();

        if count == 0 {
            return Statistics {
                count,
                min: f64::NAN,
                max: f64::NAN,
                sum: 0.0,
                mean: f64::NAN,
                quartiles: [f64::NAN; 3],
                iqr: f64::NAN,
            };
        }

        let sum = self.sum + self.compensation;
        let quartiles = self.reservoir.quartiles();

        Statistics {
            count,
            min: self.min,
            max: self.max,
            sum,
            mean: sum / count as f64,
            quartiles,
            iqr: quartiles[2] - quartiles[0],
        }
    }
}

/// A collector for each field of a sensor's readings.
#[derive(Clone, Debug)]
pub struct SensorCollector {
    sensor: Sensor,
    fields: Vec<ValueCollector>,
}

impl SensorCollector {
    pub fn new(sensor: Sensor) -> Self {
        Self {
            sensor,
            fields: sensor
                .fields()
                .iter()
                .map(|_| ValueCollector::default())
                .collect(),
        }
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    /// A reading, its values in the order of the sensor's fields.
    pub fn add_reading(&mut self, values: &[f32]) {
        for (collector, value) in self.fields.iter_mut().zip(values) {
            _ = collector.add(f64::from(*value));
        }
    }

    /// A record of the sensor's value schema. Fields that are missing or
    /// not floats are skipped.
    pub fn add_value(&mut self, value: &Value) {
        let Value::Record(record) = value else {
            debug!(sensor = %self.sensor, ?value);
            return;
        };

        for (name, collector) in self.sensor.fields().iter().zip(self.fields.iter_mut()) {
            match record.iter().find(|(field, _)| field == name) {
                Some((_, Value::Float(reading))) => _ = collector.add(f64::from(*reading)),
                Some((_, Value::Double(reading))) => _ = collector.add(*reading),
                otherwise => debug!(sensor = %self.sensor, name, ?otherwise),
            }
        }
    }

    pub fn statistics(&self) -> impl Iterator<Item = (&'static str, Statistics)> + '_ {
        self.sensor
            .fields()
            .iter()
            .copied()
            .zip(self.fields.iter().map(ValueCollector::statistics))
    }
}
