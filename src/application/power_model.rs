// Synthetic diurnal power waveforms
use rand::Rng;
use std::f64::consts::PI;

pub const PEAK_SOLAR_KW: f64 = 4.5;
pub const BASE_CONSUMPTION_KW: f64 = 2.5;
pub const MIN_CONSUMPTION_KW: f64 = 0.5;

const SOLAR_NOISE_KW: f64 = 0.25;
const CONSUMPTION_NOISE_KW: f64 = 0.4;
const MAX_JITTER_HOURS: f64 = 2.0;
const DAYLIGHT_HOURS: std::ops::RangeInclusive<u32> = 6..=18;

/// Random terms of one sample, drawn fresh for every sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Perturbation {
    pub solar_noise: f64,
    pub consumption_jitter_hours: f64,
    pub consumption_noise: f64,
}

impl Perturbation {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            solar_noise: rng.gen_range(-SOLAR_NOISE_KW..SOLAR_NOISE_KW),
            consumption_jitter_hours: rng.gen_range(0.0..MAX_JITTER_HOURS),
            consumption_noise: rng.gen_range(-CONSUMPTION_NOISE_KW..CONSUMPTION_NOISE_KW),
        }
    }
}

/// Bell curve over daylight hours, 0.2 at the edges and 1.0 at noon.
/// Zero outside [6, 18].
pub fn solar_multiplier(hour: u32) -> f64 {
    if !DAYLIGHT_HOURS.contains(&hour) {
        return 0.0;
    }
    let normalized_hour = (hour as f64 - 6.0) / 12.0;
    (normalized_hour * PI).sin() * 0.8 + 0.2
}

/// Unrounded solar output in kW, never negative.
pub fn solar_generation(hour: u32, noise: &Perturbation) -> f64 {
    (PEAK_SOLAR_KW * solar_multiplier(hour) + noise.solar_noise).max(0.0)
}

/// Unrounded house consumption in kW, never under `MIN_CONSUMPTION_KW`.
pub fn house_consumption(hour: u32, noise: &Perturbation) -> f64 {
    let phase = (hour as f64 + noise.consumption_jitter_hours) / 24.0 * 2.0 * PI;
    let baseline = BASE_CONSUMPTION_KW + phase.sin() * 1.5 + 1.5 + noise.consumption_noise;
    baseline.max(MIN_CONSUMPTION_KW)
}
