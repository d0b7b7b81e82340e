//! Fixed-size latency histogram.
//!
//! Latencies are folded into logarithmic buckets (about 1.6% relative
//! width) so memory stays constant however many requests a run sends.
//! Minimum, maximum and mean are tracked exactly.

use std::time::Duration;

const BUCKETS: usize = 4096;
const GROWTH: f64 = 1.016;

#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    counts: Vec<u64>,
    total: u64,
    sum_micros: u128,
    min_micros: u64,
    max_micros: u64,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        Self {
            counts: vec![0; BUCKETS],
            total: 0,
            sum_micros: 0,
            min_micros: u64::MAX,
            max_micros: 0,
        }
    }

    /// Records one latency sample.
    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.counts[bucket_of(micros)] += 1;
        self.total += 1;
        self.sum_micros += u128::from(micros);
        self.min_micros = self.min_micros.min(micros);
        self.max_micros = self.max_micros.max(micros);
    }

    pub fn count(&self) -> u64 {
        self.total
    }

    pub fn min(&self) -> Duration {
        if self.total == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(self.min_micros)
        }
    }

    pub fn max(&self) -> Duration {
        Duration::from_micros(self.max_micros)
    }

    pub fn mean(&self) -> Duration {
        if self.total == 0 {
            return Duration::ZERO;
        }
        let mean = self.sum_micros / u128::from(self.total);
        Duration::from_micros(u64::try_from(mean).unwrap_or(u64::MAX))
    }

    /// Nearest-rank percentile for `quantile` in 0..=1.
    ///
    /// Returns the midpoint of the bucket holding the ranked sample, clamped
    /// to the exact observed range. An empty histogram yields zero.
    pub fn percentile(&self, quantile: f64) -> Duration {
        if self.total == 0 {
            return Duration::ZERO;
        }
        let rank = ((quantile.clamp(0.0, 1.0) * self.total as f64).ceil() as u64).max(1);

        let mut seen = 0u64;
        for (index, count) in self.counts.iter().enumerate() {
            seen += count;
            if seen >= rank {
                let micros = bucket_midpoint(index).clamp(self.min_micros as f64, self.max_micros as f64);
                return Duration::from_micros(micros.round() as u64);
            }
        }
        self.max()
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

fn bucket_of(micros: u64) -> usize {
    if micros <= 1 {
        return 0;
    }
    let index = ((micros as f64).ln() / GROWTH.ln()) as usize;
    index.min(BUCKETS - 1)
}

fn bucket_midpoint(index: usize) -> f64 {
    GROWTH.powf(index as f64 + 0.5)
}
