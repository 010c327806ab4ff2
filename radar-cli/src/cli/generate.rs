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
    fs::File,
    io::{self, BufWriter, Write},
    num::NonZeroU32,
    path::PathBuf,
};

use super::log_statistics;
use crate::{EnvVarExp, Result};
use clap::Args;
use radar_mock::{Generator, Sensor, SensorCollector};
use tracing::info;

#[derive(Args, Clone, Debug)]
pub(super) struct Arg {
    /// The sensor to simulate, for example: ACCELEROMETER or THERMOMETER
    #[arg(long, env = "RADAR_SENSOR")]
    sensor: EnvVarExp<Sensor>,

    /// Seconds of readings to generate
    #[arg(long, default_value = "60")]
    duration_seconds: u64,

    /// Readings per second
    #[arg(long, default_value = "1")]
    frequency: NonZeroU32,

    #[arg(long, env = "RADAR_USER_ID")]
    user_id: Option<String>,

    #[arg(long, env = "RADAR_SOURCE_ID")]
    source_id: Option<String>,

    /// Seconds since the epoch of the first reading [default: now]
    #[arg(long)]
    time_zero: Option<f64>,

    /// Seed for repeatable readings
    #[arg(long)]
    seed: Option<u64>,

    /// The CSV file to write [default: stdout]
    #[arg(long)]
    output: Option<EnvVarExp<PathBuf>>,
}

impl Arg {
    pub(super) fn main(self) -> Result<u64> {
        let generator = Generator::builder()
            .sensor(self.sensor.into_inner())
            .duration(self.duration_seconds)
            .frequency(self.frequency)
            .user_id(self.user_id)
            .source_id(self.source_id)
            .time_zero(self.time_zero)
            .seed(self.seed)
            .build()?;

        let mut collector = SensorCollector::new(generator.sensor());

        let rows = if let Some(output) = self.output.map(EnvVarExp::into_inner) {
            let mut writer = File::create(&output).map(BufWriter::new)?;
            let rows = generator.write_collecting(&mut writer, &mut collector)?;
            writer.flush()?;
            info!(sensor = %generator.sensor(), rows, output = %output.display());
            rows
        } else {
            let rows = generator.write_collecting(io::stdout().lock(), &mut collector)?;
            info!(sensor = %generator.sensor(), rows);
            rows
        };

        log_statistics(&collector);
        Ok(rows)
    }
}
