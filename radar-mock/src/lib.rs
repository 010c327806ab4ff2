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

//! Mock sensor data.
//!
//! Simulated wearable sensor readings written as CSV, and those CSV rows
//! read back as Avro values of the sensor's value schema.

use std::{fmt, io, num::ParseFloatError, result, sync::Arc};

pub mod collector;
pub mod generator;
pub mod reader;
pub mod sensor;

pub use collector::{SensorCollector, Statistics};
pub use generator::{Generator, Row};
pub use sensor::Sensor;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    Avro(Box<apache_avro::Error>),
    Csv(#[from] csv::Error),

    /// A CSV header that does not match the columns of the sensor.
    Header { expected: Vec<String>, found: Vec<String> },

    Io(Arc<io::Error>),
    Message(String),

    /// A row with the wrong number of columns.
    Row { line: u64, columns: usize },

    ParseFloat(#[from] ParseFloatError),

    /// A duration and frequency giving more rows than can be counted.
    TooManyRows { duration: u64, frequency: u32 },

    RecordSet(#[from] radar_record_set::Error),

    /// Fewer values counted than samples kept.
    ReservoirCount { count: u64, samples: usize },

    UnsupportedSensor(String),
}

impl From<apache_avro::Error> for Error {
    fn from(value: apache_avro::Error) -> Self {
        Self::Avro(Box::new(value))
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "{msg}"),
            Self::UnsupportedSensor(sensor) => write!(f, "{sensor} is not yet supported"),
            error => write!(f, "{error:?}"),
        }
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;
