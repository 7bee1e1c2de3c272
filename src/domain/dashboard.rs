// Monitoring dashboard domain model
use super::power::{FlowDirection, PowerSample};
use super::telemetry::{ChartData, TileData};

/// Daily totals shown under the charts. These are fixed figures and are not
/// derived from the rolling history.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub generation_kwh: f64,
    pub consumption_kwh: f64,
    pub grid_import_kwh: f64,
    pub self_sufficiency_pct: f64,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    /// Oldest first, the last entry is `current`
    pub history: Vec<PowerSample>,
    pub current: Option<PowerSample>,
    pub direction: FlowDirection,
    pub tiles: Vec<TileData>,
    pub charts: Vec<ChartData>,
    pub summary: DailySummary,
}

impl Dashboard {
    pub fn new(
        title: String,
        history: Vec<PowerSample>,
        tiles: Vec<TileData>,
        charts: Vec<ChartData>,
        summary: DailySummary,
    ) -> Self {
        let current = history.last().cloned();
        let direction = current
            .as_ref()
            .map(PowerSample::direction)
            .unwrap_or(FlowDirection::Balanced);
        Self {
            title,
            history,
            current,
            direction,
            tiles,
            charts,
            summary,
        }
    }
}
