// Mapper to convert domain models to JSON wire types
use crate::application::control_service::{Acknowledgement, ControlSnapshot};
use crate::application::monitoring_service::MonitoringMessage;
use crate::domain::dashboard::{DailySummary, Dashboard};
use crate::domain::power::PowerSample;
use crate::domain::telemetry::{ChartData, SeriesData, TileData};
use crate::infrastructure::config::DeviceInfo;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SampleDto {
    pub timestamp: String,
    pub solar_generation: f64,
    pub house_consumption: f64,
    pub grid_flow: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDto {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub value: f64,
    pub precision: i32,
    pub caption: String,
    pub badge: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDto {
    pub label: String,
    pub time_ms: i64,
    pub value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDto {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub points: Vec<PointDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDto {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub unit: Option<String>,
    pub kind: &'static str,
    pub series: Vec<SeriesDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub generation_kwh: f64,
    pub consumption_kwh: f64,
    pub grid_import_kwh: f64,
    pub self_sufficiency_pct: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub title: String,
    pub current: Option<SampleDto>,
    pub grid_status: &'static str,
    pub history: Vec<SampleDto>,
    pub tiles: Vec<TileDto>,
    pub charts: Vec<ChartDto>,
    pub summary: SummaryDto,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamMessageDto {
    Snapshot { dashboard: DashboardDto },
    Sample {
        sample: SampleDto,
        #[serde(rename = "gridStatus")]
        grid_status: &'static str,
        tiles: Vec<TileDto>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastCommandDto {
    pub command: &'static str,
    pub issued_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPanelDto {
    pub system_status: &'static str,
    pub system_status_label: &'static str,
    pub connection_status: &'static str,
    pub connection_status_label: &'static str,
    pub busy: bool,
    pub available_commands: Vec<&'static str>,
    pub last_command: Option<LastCommandDto>,
    pub location: String,
    pub protocol: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgementDto {
    pub command: &'static str,
    pub system_status: &'static str,
    pub message: &'static str,
    pub acknowledged_at: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorDto {
    pub error: String,
}

pub fn sample_to_dto(sample: &PowerSample) -> SampleDto {
    SampleDto {
        timestamp: sample.label(),
        solar_generation: sample.solar_generation,
        house_consumption: sample.house_consumption,
        grid_flow: sample.grid_flow,
    }
}

pub fn dashboard_to_dto(dashboard: Dashboard) -> DashboardDto {
    DashboardDto {
        title: dashboard.title,
        current: dashboard.current.as_ref().map(sample_to_dto),
        grid_status: dashboard.direction.as_str(),
        history: dashboard.history.iter().map(sample_to_dto).collect(),
        tiles: dashboard.tiles.into_iter().map(tile_to_dto).collect(),
        charts: dashboard.charts.into_iter().map(chart_to_dto).collect(),
        summary: summary_to_dto(&dashboard.summary),
    }
}

pub fn message_to_dto(message: MonitoringMessage) -> StreamMessageDto {
    match message {
        MonitoringMessage::Snapshot(dashboard) => StreamMessageDto::Snapshot {
            dashboard: dashboard_to_dto(dashboard),
        },
        MonitoringMessage::Sample {
            sample,
            direction,
            tiles,
        } => StreamMessageDto::Sample {
            sample: sample_to_dto(&sample),
            grid_status: direction.as_str(),
            tiles: tiles.into_iter().map(tile_to_dto).collect(),
        },
    }
}

pub fn control_to_dto(snapshot: ControlSnapshot, device: &DeviceInfo) -> ControlPanelDto {
    let state = snapshot.state;
    ControlPanelDto {
        system_status: state.system.as_str(),
        system_status_label: state.system.label(),
        connection_status: state.connection.as_str(),
        connection_status_label: state.connection.label(),
        busy: snapshot.busy,
        available_commands: snapshot.available.iter().map(|c| c.as_str()).collect(),
        last_command: state.last_command.map(|record| LastCommandDto {
            command: record.command.as_str(),
            issued_at: record.issued_at.format("%H:%M:%S").to_string(),
        }),
        location: device.location.clone(),
        protocol: device.protocol.clone(),
    }
}

pub fn ack_to_dto(ack: &Acknowledgement) -> AcknowledgementDto {
    AcknowledgementDto {
        command: ack.command.as_str(),
        system_status: ack.status.as_str(),
        message: ack.message(),
        acknowledged_at: ack.acknowledged_at.format("%H:%M:%S").to_string(),
    }
}

fn tile_to_dto(tile: TileData) -> TileDto {
    TileDto {
        id: tile.id,
        title: tile.title,
        unit: tile.unit,
        value: tile.value,
        precision: tile.precision,
        caption: tile.caption,
        badge: tile.badge,
    }
}

fn chart_to_dto(chart: ChartData) -> ChartDto {
    ChartDto {
        id: chart.id,
        title: chart.title,
        subtitle: chart.subtitle,
        unit: chart.unit,
        kind: chart.kind.as_str(),
        series: chart.series.into_iter().map(series_to_dto).collect(),
    }
}

fn series_to_dto(series: SeriesData) -> SeriesDto {
    let points = series
        .points
        .into_iter()
        .map(|p| PointDto {
            label: p.label,
            time_ms: p.time_ms,
            value: p.value,
        })
        .collect();

    SeriesDto {
        id: series.id,
        name: series.name,
        color: series.color,
        points,
    }
}

fn summary_to_dto(summary: &DailySummary) -> SummaryDto {
    SummaryDto {
        generation_kwh: summary.generation_kwh,
        consumption_kwh: summary.consumption_kwh,
        grid_import_kwh: summary.grid_import_kwh,
        self_sufficiency_pct: summary.self_sufficiency_pct,
    }
}
