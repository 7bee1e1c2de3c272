// Power-flow domain model
use chrono::NaiveDateTime;
use serde::Deserialize;

/// Net flow magnitude (kW) under which the grid counts as balanced.
pub const BALANCE_THRESHOLD_KW: f64 = 0.1;

/// One power-flow observation, values in kW rounded to one decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSample {
    pub recorded_at: NaiveDateTime,
    pub solar_generation: f64,
    pub house_consumption: f64,
    /// Positive exports surplus to the grid, negative imports a deficit.
    pub grid_flow: f64,
}

impl PowerSample {
    pub fn new(
        recorded_at: NaiveDateTime,
        solar_generation: f64,
        house_consumption: f64,
        grid_flow: f64,
    ) -> Self {
        Self {
            recorded_at,
            solar_generation,
            house_consumption,
            grid_flow,
        }
    }

    /// Wall-clock label in 24-hour `HH:MM` form
    pub fn label(&self) -> String {
        self.recorded_at.format("%H:%M").to_string()
    }

    pub fn direction(&self) -> FlowDirection {
        FlowDirection::classify(self.grid_flow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    Exporting,
    Importing,
    Balanced,
}

impl FlowDirection {
    pub fn classify(flow: f64) -> Self {
        if flow > BALANCE_THRESHOLD_KW {
            FlowDirection::Exporting
        } else if flow < -BALANCE_THRESHOLD_KW {
            FlowDirection::Importing
        } else {
            FlowDirection::Balanced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowDirection::Exporting => "exporting",
            FlowDirection::Importing => "importing",
            FlowDirection::Balanced => "balanced",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FlowDirection::Exporting => "Exporting to Grid",
            FlowDirection::Importing => "Importing from Grid",
            FlowDirection::Balanced => "Balanced",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            FlowDirection::Exporting => "Surplus",
            FlowDirection::Importing => "Deficit",
            FlowDirection::Balanced => "Balanced",
        }
    }
}

/// Which values the stored grid flow is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridFlowRounding {
    /// Subtract the already-rounded generation and consumption, then round.
    #[default]
    FromRounded,
    /// Round the difference of the unrounded generation and consumption.
    FromRaw,
}

impl GridFlowRounding {
    pub fn grid_flow(&self, raw_solar: f64, raw_consumption: f64) -> f64 {
        match self {
            GridFlowRounding::FromRounded => {
                round_tenth(round_tenth(raw_solar) - round_tenth(raw_consumption))
            }
            GridFlowRounding::FromRaw => round_tenth(raw_solar - raw_consumption),
        }
    }
}

/// Round to one decimal place, half away from zero. Never returns `-0.0`.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0 + 0.0
}
