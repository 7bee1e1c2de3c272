// Domain layer - Plain data and pure rules
pub mod control;
pub mod dashboard;
pub mod history;
pub mod power;
pub mod telemetry;
