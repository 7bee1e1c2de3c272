// Telemetry sampler - Synthetic power samples and the rolling history they feed
use crate::application::power_model::{self, Perturbation};
use crate::domain::history::History;
use crate::domain::power::{round_tenth, GridFlowRounding, PowerSample};
use chrono::{Duration, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub history_len: usize,
    pub seed_count: usize,
    pub seed_spacing: Duration,
    pub rounding: GridFlowRounding,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            history_len: 20,
            seed_count: 20,
            seed_spacing: Duration::minutes(3),
            rounding: GridFlowRounding::default(),
        }
    }
}

/// Produces one sample per call and keeps the bounded history for charting.
/// One sampler belongs to one monitoring view.
#[derive(Debug)]
pub struct TelemetrySampler<R = StdRng> {
    rng: R,
    history: History,
    settings: SamplerSettings,
}

impl TelemetrySampler<StdRng> {
    pub fn from_entropy(settings: SamplerSettings) -> Self {
        Self::new(StdRng::from_entropy(), settings)
    }
}

impl<R: Rng> TelemetrySampler<R> {
    pub fn new(rng: R, settings: SamplerSettings) -> Self {
        Self {
            rng,
            history: History::with_capacity(settings.history_len),
            settings,
        }
    }

    /// Generate a sample for `at` without touching the history.
    pub fn sample(&mut self, at: NaiveDateTime) -> PowerSample {
        let noise = Perturbation::draw(&mut self.rng);
        sample_with(at, &noise, self.settings.rounding)
    }

    /// Replace the history with `n` samples spaced `seed_spacing` apart,
    /// oldest first, the last one at `now`.
    pub fn seed(&mut self, now: NaiveDateTime, n: usize) -> Vec<PowerSample> {
        self.history.clear();
        let mut seeded = Vec::with_capacity(n);
        for i in (0..n).rev() {
            let at = now - self.settings.seed_spacing * i as i32;
            let sample = self.sample(at);
            self.history.push(sample.clone());
            seeded.push(sample);
        }
        tracing::debug!(
            "Seeded {} samples ending at {} into a window of {}",
            n,
            now,
            self.history.capacity()
        );
        seeded
    }

    /// Seed with the configured count.
    pub fn seed_default(&mut self, now: NaiveDateTime) -> Vec<PowerSample> {
        let n = self.settings.seed_count;
        self.seed(now, n)
    }

    pub fn tick(&mut self, now: NaiveDateTime) -> PowerSample {
        let sample = self.sample(now);
        self.history.push(sample.clone());
        sample
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current(&self) -> Option<&PowerSample> {
        self.history.latest()
    }
}

/// Deterministic part of the generator, given the random terms.
pub fn sample_with(
    at: NaiveDateTime,
    noise: &Perturbation,
    rounding: GridFlowRounding,
) -> PowerSample {
    let hour = at.hour();
    let solar = power_model::solar_generation(hour, noise);
    let consumption = power_model::house_consumption(hour, noise);

    PowerSample::new(
        at,
        round_tenth(solar),
        round_tenth(consumption),
        rounding.grid_flow(solar, consumption),
    )
}
