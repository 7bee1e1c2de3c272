use crate::application::control_service::DispatchTimings;
use crate::application::telemetry_sampler::SamplerSettings;
use crate::domain::control::ConnectionStatus;
use crate::domain::dashboard::DailySummary;
use crate::domain::power::GridFlowRounding;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

const CONFIG_FILE: &str = "config/dashboard";
const ENV_PREFIX: &str = "SOLAR_DASHBOARD";

const MAX_HISTORY_LEN: usize = 10_000;
const MAX_SEED_WINDOW_SECS: i64 = 24 * 60 * 60;
const MAX_TIMER_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub sampler: SamplerConfig,
    pub control: ControlConfig,
    pub device: DeviceInfo,
    pub summary: SummaryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SamplerConfig {
    pub history_len: usize,
    pub seed_count: usize,
    pub seed_spacing_secs: i64,
    pub tick_interval_ms: u64,
    pub grid_flow_rounding: GridFlowRounding,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            history_len: 20,
            seed_count: 20,
            seed_spacing_secs: 180,
            tick_interval_ms: 30_000,
            grid_flow_rounding: GridFlowRounding::FromRounded,
        }
    }
}

impl SamplerConfig {
    pub fn settings(&self) -> SamplerSettings {
        SamplerSettings {
            history_len: self.history_len,
            seed_count: self.seed_count,
            seed_spacing: chrono::Duration::seconds(self.seed_spacing_secs),
            rounding: self.grid_flow_rounding,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlConfig {
    pub latency_ms: u64,
    pub restart_delay_ms: u64,
    pub initial_connection: ConnectionStatus,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            latency_ms: 1500,
            restart_delay_ms: 3000,
            initial_connection: ConnectionStatus::Connected,
        }
    }
}

impl ControlConfig {
    pub fn timings(&self) -> DispatchTimings {
        DispatchTimings {
            latency: Duration::from_millis(self.latency_ms),
            restart_delay: Duration::from_millis(self.restart_delay_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeviceInfo {
    pub location: String,
    pub protocol: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            location: "Router".to_string(),
            protocol: "Azure IoT Hub".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SummaryConfig {
    pub generation_kwh: f64,
    pub consumption_kwh: f64,
    pub grid_import_kwh: f64,
    pub self_sufficiency_pct: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            generation_kwh: 24.8,
            consumption_kwh: 31.2,
            grid_import_kwh: 6.4,
            self_sufficiency_pct: 79.5,
        }
    }
}

impl From<&SummaryConfig> for DailySummary {
    fn from(config: &SummaryConfig) -> Self {
        DailySummary {
            generation_kwh: config.generation_kwh,
            consumption_kwh: config.consumption_kwh,
            grid_import_kwh: config.grid_import_kwh,
            self_sufficiency_pct: config.self_sufficiency_pct,
        }
    }
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sampler.tick_interval_ms == 0 {
            anyhow::bail!("sampler.tick_interval_ms must be greater than zero");
        }
        if self.sampler.history_len == 0 {
            anyhow::bail!("sampler.history_len must be greater than zero");
        }
        if self.sampler.history_len > MAX_HISTORY_LEN {
            anyhow::bail!("sampler.history_len must be at most {}", MAX_HISTORY_LEN);
        }
        if self.sampler.seed_count > MAX_HISTORY_LEN {
            anyhow::bail!("sampler.seed_count must be at most {}", MAX_HISTORY_LEN);
        }
        if self.sampler.seed_spacing_secs <= 0 {
            anyhow::bail!("sampler.seed_spacing_secs must be greater than zero");
        }
        // the backfill reaches seed_count * spacing into the past
        let window = i64::try_from(self.sampler.seed_count)
            .ok()
            .and_then(|n| n.checked_mul(self.sampler.seed_spacing_secs));
        if !matches!(window, Some(w) if w <= MAX_SEED_WINDOW_SECS) {
            anyhow::bail!(
                "sampler.seed_count * sampler.seed_spacing_secs must span at most {} seconds",
                MAX_SEED_WINDOW_SECS
            );
        }
        for (key, ms) in [
            ("sampler.tick_interval_ms", self.sampler.tick_interval_ms),
            ("control.latency_ms", self.control.latency_ms),
            ("control.restart_delay_ms", self.control.restart_delay_ms),
        ] {
            if ms > MAX_TIMER_MS {
                anyhow::bail!("{} must be at most {} ms", key, MAX_TIMER_MS);
            }
        }
        Ok(())
    }
}
