// Domain layer - Templates, dashboards and metric series
pub mod dashboard;
pub mod metrics;
pub mod query;
pub mod template;
