use std::collections::VecDeque;

use rand::Rng;

/// Something that reports the latest measured DC value of every channel.
pub trait MeasurementSource {
    /// `None` when no new reading is available yet.
    fn next_values(&mut self) -> Option<Vec<f64>>;
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Vec<f64>>,
}

impl ManualSource {
    pub fn new(batches: impl IntoIterator<Item = Vec<f64>>) -> Self {
        Self {
            queue: batches.into_iter().collect(),
        }
    }

    pub fn push(&mut self, values: Vec<f64>) {
        self.queue.push_back(values);
    }
}

impl MeasurementSource for ManualSource {
    fn next_values(&mut self) -> Option<Vec<f64>> {
        self.queue.pop_front()
    }
}

/// Fixed DC level per channel plus a little noise.
pub struct SimulatedSource {
    levels: Vec<f64>,
    noise: f64,
}

impl SimulatedSource {
    pub fn new(levels: Vec<f64>, noise: f64) -> Self {
        Self {
            levels,
            noise: noise.abs(),
        }
    }

    /// Channel `n` sits near `n` volts.
    pub fn with_channels(channel_count: usize) -> Self {
        Self::new((1..=channel_count).map(|n| n as f64).collect(), 0.005)
    }
}

impl MeasurementSource for SimulatedSource {
    fn next_values(&mut self) -> Option<Vec<f64>> {
        let mut rng = rand::thread_rng();
        let noise = self.noise;
        Some(
            self.levels
                .iter()
                .map(|level| {
                    if noise > 0.0 {
                        level + rng.gen_range(-noise..noise)
                    } else {
                        *level
                    }
                })
                .collect(),
        )
    }
}
