// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::domain::query::DEFAULT_RAW_AGGREGATOR;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    /// Aggregator for raw charts when neither the request nor the chart sets one
    pub raw_data_aggregator: String,
}

impl AppState {
    pub fn new(dashboard_service: DashboardService, raw_data_aggregator: &str) -> Self {
        let raw_data_aggregator = match raw_data_aggregator.trim() {
            "" => DEFAULT_RAW_AGGREGATOR,
            aggregator => aggregator,
        };
        Self {
            dashboard_service,
            raw_data_aggregator: raw_data_aggregator.to_string(),
        }
    }
}
