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

use std::num::NonZeroUsize;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};

use crate::{Error, Result};

pub const DEFAULT_MAX_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(998);

/// Interpolated quartiles of sorted values, all NaN when there are none.
pub fn quartiles(sorted: &[f64]) -> [f64; 3] {
    match sorted {
        [] => [f64::NAN; 3],
        [only] => [*only; 3],
        _ => [1.0, 2.0, 3.0].map(|quarter| {
            let position = quarter * (sorted.len() + 1) as f64 / 4.0;
            let below = position as usize;

            if below == 0 {
                sorted[0]
            } else if below >= sorted.len() {
                sorted[sorted.len() - 1]
            } else {
                let base = sorted[below - 1];
                base + (position - below as f64) * (sorted[below] - base)
            }
        }),
    }
}

/// A bounded, sorted sample drawn uniformly from every value added.
///
/// Once full, the n-th value added replaces a random sample with
/// probability `max_size / n`.
#[derive(Clone, Debug)]
pub struct UniformSamplingReservoir {
    samples: Vec<f64>,
    max_size: NonZeroUsize,
    count: u64,
    rng: StdRng,
}

impl Default for UniformSamplingReservoir {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl UniformSamplingReservoir {
    pub fn new(max_size: NonZeroUsize) -> Self {
        Self {
            samples: Vec::with_capacity(max_size.get()),
            max_size,
            count: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// A reservoir that has already seen `count` values, of which `samples`
    /// were kept. Keeps a uniform subsample when there are too many.
    pub fn from_samples(samples: &[f64], count: u64, max_size: NonZeroUsize) -> Result<Self> {
        if count < samples.len() as u64 {
            return Err(Error::ReservoirCount {
                count,
                samples: samples.len(),
            });
        }

        let mut reservoir = Self::new(max_size);
        reservoir.count = count;

        if samples.len() > max_size.get() {
            reservoir.samples = index::sample(&mut reservoir.rng, samples.len(), max_size.get())
                .into_iter()
                .map(|i| samples[i])
                .collect();
        } else {
            reservoir.samples.extend_from_slice(samples);
        }

        reservoir.samples.sort_by(f64::total_cmp);
        Ok(reservoir)
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..self
        }
    }

    pub fn add(&mut self, value: f64) {
        if self.samples.len() < self.max_size.get() {
            self.insert(value);
        } else {
            let replace = self.rng.random_range(0..self.count);

            if replace < self.samples.len() as u64 {
                _ = self.samples.remove(replace as usize);
                self.insert(value);
            }
        }

        self.count += 1;
    }

    fn insert(&mut self, value: f64) {
        let at = self
            .samples
            .partition_point(|sample| sample.total_cmp(&value).is_lt());
        self.samples.insert(at, value);
    }

    pub fn quartiles(&self) -> [f64; 3] {
        quartiles(&self.samples)
    }

    /// The samples kept, in ascending order.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn max_size(&self) -> NonZeroUsize {
        self.max_size
    }

    /// Every value added, kept or not.
    pub fn count(&self) -> u64 {
        self.count
    }
}
