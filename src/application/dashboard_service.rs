// Dashboard builder - Turns a sample history into tiles and charts
use crate::domain::dashboard::{DailySummary, Dashboard};
use crate::domain::history::History;
use crate::domain::power::PowerSample;
use crate::domain::telemetry::{ChartData, ChartKind, SeriesData, TileData, TimeSeriesPoint};

const SOLAR_COLOR: &str = "#22c55e";
const CONSUMPTION_COLOR: &str = "#f59e0b";
const GRID_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone)]
pub struct DashboardBuilder {
    summary: DailySummary,
}

impl DashboardBuilder {
    pub fn new(summary: DailySummary) -> Self {
        Self { summary }
    }

    pub fn build(&self, history: &History) -> Dashboard {
        let tiles = history.latest().map(Self::tiles).unwrap_or_default();
        let charts = vec![Self::power_flow_chart(history), Self::energy_balance_chart(history)];

        Dashboard::new(
            "Power Monitoring".to_string(),
            history.to_vec(),
            tiles,
            charts,
            self.summary.clone(),
        )
    }

    /// Tiles for the latest sample
    pub fn tiles(sample: &PowerSample) -> Vec<TileData> {
        let direction = sample.direction();
        vec![
            TileData::new(
                "solarGeneration".to_string(),
                "Solar Generation".to_string(),
                "kW".to_string(),
                sample.solar_generation,
                1,
                "Current output from panels".to_string(),
                "Active".to_string(),
            ),
            TileData::new(
                "houseConsumption".to_string(),
                "House Consumption".to_string(),
                "kW".to_string(),
                sample.house_consumption,
                1,
                "Total household usage".to_string(),
                "Consuming".to_string(),
            ),
            TileData::new(
                "gridFlow".to_string(),
                "Grid Flow".to_string(),
                "kW".to_string(),
                // direction is carried by caption and badge
                sample.grid_flow.abs(),
                1,
                direction.description().to_string(),
                direction.badge().to_string(),
            ),
        ]
    }

    fn power_flow_chart(history: &History) -> ChartData {
        ChartData::new(
            "powerFlow".to_string(),
            "Power Flow Over Time".to_string(),
            "Real-time power generation and consumption (last hour)".to_string(),
            Some("kW".to_string()),
            ChartKind::MultiLine,
            vec![
                Self::series(history, "solarGeneration", "Solar Generation", SOLAR_COLOR, |s| {
                    s.solar_generation
                }),
                Self::series(
                    history,
                    "houseConsumption",
                    "House Consumption",
                    CONSUMPTION_COLOR,
                    |s| s.house_consumption,
                ),
            ],
        )
    }

    fn energy_balance_chart(history: &History) -> ChartData {
        ChartData::new(
            "energyBalance".to_string(),
            "Energy Balance".to_string(),
            "Net energy flow and grid interaction".to_string(),
            Some("kW".to_string()),
            ChartKind::Area,
            vec![Self::series(history, "gridFlow", "Grid Flow", GRID_COLOR, |s| {
                s.grid_flow
            })],
        )
    }

    fn series(
        history: &History,
        id: &str,
        name: &str,
        color: &str,
        value: impl Fn(&PowerSample) -> f64,
    ) -> SeriesData {
        let points = history
            .iter()
            .map(|s| {
                TimeSeriesPoint::new(
                    s.label(),
                    s.recorded_at.and_utc().timestamp_millis(),
                    value(s),
                )
            })
            .collect();
        SeriesData::new(id.to_string(), name.to_string(), Some(color.to_string()), points)
    }
}
