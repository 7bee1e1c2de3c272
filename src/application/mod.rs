// Application layer - Use cases
pub mod command_transport;
pub mod control_service;
pub mod dashboard_service;
pub mod monitoring_service;
pub mod power_model;
pub mod repeating_task;
pub mod telemetry_sampler;
