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

use std::{ffi::OsString, process};

use crate::Result;
use clap::{Parser, Subcommand};
use radar_mock::SensorCollector;
use tracing::{debug, info};

mod encode;
mod generate;

#[derive(Clone, Debug, Parser)]
#[command(name = "radar", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Simulate the readings of a wearable sensor as CSV
    Generate(Box<generate::Arg>),

    /// Encode CSV readings as an Avro record set
    Encode(Box<encode::Arg>),
}

impl Cli {
    pub fn main() -> Result<()> {
        debug!(pid = process::id());
        Self::parse().run()
    }

    pub fn try_main<I, T>(args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
            .map_err(Into::into)
            .and_then(Self::run)
    }

    fn run(self) -> Result<()> {
        match self.command {
            Command::Generate(arg) => arg
                .main()
                .map(|rows| debug!(rows))
                .inspect_err(|err| debug!(?err)),

            Command::Encode(arg) => arg
                .main()
                .map(|written| debug!(written))
                .inspect_err(|err| debug!(?err)),
        }
    }
}

/// Summarise the readings of each field.
fn log_statistics(collector: &SensorCollector) {
    for (field, statistics) in collector.statistics() {
        let [q1, median, q3] = statistics.quartiles;

        info!(
            sensor = %collector.sensor(),
            field,
            count = statistics.count,
            min = statistics.min,
            max = statistics.max,
            mean = statistics.mean,
            q1,
            median,
            q3,
            iqr = statistics.iqr
        );
    }
}
