// Application state for HTTP handlers
use crate::application::control_service::CommandDispatcher;
use crate::application::monitoring_service::MonitoringService;
use crate::infrastructure::config::DeviceInfo;

#[derive(Clone)]
pub struct AppState {
    pub monitoring_service: MonitoringService,
    pub dispatcher: CommandDispatcher,
    pub device: DeviceInfo,
}
