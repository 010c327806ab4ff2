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

//! Simulated wearable sensors.

use std::{fmt, ops::Range, str::FromStr};

use apache_avro::schema::Schema as AvroSchema;
use radar_record_set::{ObservationKey, Topic};
use rand::{Rng, rngs::StdRng};
use serde_json::{Value, json};

use crate::{Error, Result};

const NAMESPACE: &str = "org.radarcns.passive.empatica";

#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Sensor {
    Accelerometer,
    BatteryLevel,
    BloodVolumePulse,
    ElectrodermalActivity,
    InterBeatInterval,
    Thermometer,
}

impl Sensor {
    pub const ALL: [Sensor; 6] = [
        Sensor::Accelerometer,
        Sensor::BatteryLevel,
        Sensor::BloodVolumePulse,
        Sensor::ElectrodermalActivity,
        Sensor::InterBeatInterval,
        Sensor::Thermometer,
    ];

    /// The float fields of a reading, in CSV column and schema field order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Accelerometer => &["x", "y", "z"],
            Self::BatteryLevel => &["batteryLevel"],
            Self::BloodVolumePulse => &["bloodVolumePulse"],
            Self::ElectrodermalActivity => &["electroDermalActivity"],
            Self::InterBeatInterval => &["interBeatInterval"],
            Self::Thermometer => &["temperature"],
        }
    }

    /// The range of each random field, none for a battery that decays.
    pub fn range(&self) -> Option<Range<f32>> {
        match self {
            Self::Accelerometer => Some(0.0..2.0),
            Self::BatteryLevel => None,
            Self::BloodVolumePulse => Some(60.0..90.0),
            Self::ElectrodermalActivity => Some(0.01..0.05),
            Self::InterBeatInterval => Some(55.0..120.0),
            Self::Thermometer => Some(36.5..37.0),
        }
    }

    pub fn record_name(&self) -> &'static str {
        match self {
            Self::Accelerometer => "EmpaticaE4Acceleration",
            Self::BatteryLevel => "EmpaticaE4BatteryLevel",
            Self::BloodVolumePulse => "EmpaticaE4BloodVolumePulse",
            Self::ElectrodermalActivity => "EmpaticaE4ElectroDermalActivity",
            Self::InterBeatInterval => "EmpaticaE4InterBeatInterval",
            Self::Thermometer => "EmpaticaE4Temperature",
        }
    }

    pub fn topic_name(&self) -> &'static str {
        match self {
            Self::Accelerometer => "android_empatica_e4_acceleration",
            Self::BatteryLevel => "android_empatica_e4_battery_level",
            Self::BloodVolumePulse => "android_empatica_e4_blood_volume_pulse",
            Self::ElectrodermalActivity => "android_empatica_e4_electrodermal_activity",
            Self::InterBeatInterval => "android_empatica_e4_inter_beat_interval",
            Self::Thermometer => "android_empatica_e4_temperature",
        }
    }

    pub fn definition(&self) -> Value {
        let fields = [
            json!({"name": "time", "type": "double"}),
            json!({"name": "timeReceived", "type": "double"}),
        ]
        .into_iter()
        .chain(
            self.fields()
                .iter()
                .map(|field| json!({"name": field, "type": "float"})),
        )
        .collect::<Vec<_>>();

        json!({
            "namespace": NAMESPACE,
            "type": "record",
            "name": self.record_name(),
            "fields": fields,
        })
    }

    pub fn schema(&self) -> Result<AvroSchema> {
        AvroSchema::parse(&self.definition()).map_err(Into::into)
    }

    /// The sensor topic, keyed by the observation key.
    pub fn topic(&self) -> Result<Topic> {
        Topic::sensor(self.topic_name(), ObservationKey::schema()?, self.schema()?)
            .map_err(Into::into)
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accelerometer => "ACCELEROMETER",
            Self::BatteryLevel => "BATTERY_LEVEL",
            Self::BloodVolumePulse => "BLOOD_VOLUME_PULSE",
            Self::ElectrodermalActivity => "ELECTRODERMAL_ACTIVITY",
            Self::InterBeatInterval => "INTER_BEAT_INTERVAL",
            Self::Thermometer => "THERMOMETER",
        })
    }
}

impl FromStr for Sensor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sensor| sensor.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedSensor(s.into()))
    }
}

/// Readings of a sensor drawn from a random number generator.
#[derive(Debug)]
pub(crate) struct Readings {
    sensor: Sensor,
    rng: StdRng,
    decay: f64,
    count: f64,
}

impl Readings {
    pub(crate) fn new(sensor: Sensor, mut rng: StdRng) -> Self {
        let decay = 0.1 * rng.random::<f64>();

        Self {
            sensor,
            rng,
            decay,
            count: 1.0,
        }
    }

    pub(crate) fn next_reading(&mut self) -> Vec<f32> {
        if let Some(range) = self.sensor.range() {
            self.sensor
                .fields()
                .iter()
                .map(|_| self.rng.random_range(range.clone()))
                .collect()
        } else {
            let level = 1.0 - (self.decay * self.count % 1.0);
            self.count += 1.0;
            vec![level as f32]
        }
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn parse() -> Result<()> {
        assert_eq!(Sensor::Accelerometer, "ACCELEROMETER".parse()?);
        assert_eq!(Sensor::BatteryLevel, "battery_level".parse()?);
        assert_eq!(Sensor::Thermometer, "Thermometer".parse()?);

        for sensor in Sensor::ALL {
            assert_eq!(sensor, sensor.to_string().parse()?);
        }

        Ok(())
    }

    #[test]
    fn heart_rate_unsupported() {
        assert!(matches!(
            "HEART_RATE".parse::<Sensor>(),
            Err(Error::UnsupportedSensor(sensor)) if sensor == "HEART_RATE"
        ));

        assert!(matches!(
            "".parse::<Sensor>(),
            Err(Error::UnsupportedSensor(_))
        ));
    }

    #[test]
    fn schemas_are_sensor_topics() -> Result<()> {
        for sensor in Sensor::ALL {
            let topic = sensor.topic()?;
            assert_eq!(sensor.topic_name(), topic.name());

            let AvroSchema::Record(record) = topic.value() else {
                panic!("{sensor} value is not a record");
            };

            let names = record
                .fields
                .iter()
                .map(|field| field.name.as_str())
                .collect::<Vec<_>>();

            assert_eq!(&["time", "timeReceived"], &names[..2]);
            assert_eq!(sensor.fields(), &names[2..]);
        }

        Ok(())
    }

    #[test]
    fn readings_within_range() {
        for sensor in Sensor::ALL {
            let Some(range) = sensor.range() else {
                continue;
            };

            let mut readings = Readings::new(sensor, StdRng::seed_from_u64(6));

            for _ in 0..1_000 {
                let reading = readings.next_reading();
                assert_eq!(sensor.fields().len(), reading.len());
                assert!(
                    reading.iter().all(|value| range.contains(value)),
                    "{sensor}: {reading:?}"
                );
            }
        }
    }

    #[test]
    fn battery_decays() {
        let mut readings = Readings::new(Sensor::BatteryLevel, StdRng::seed_from_u64(32));

        let levels = (0..100)
            .map(|_| readings.next_reading()[0])
            .collect::<Vec<_>>();

        assert!(levels.iter().all(|level| *level > 0.0 && *level <= 1.0));
        assert!(levels.windows(2).any(|pair| pair[1] < pair[0]));
    }
}
