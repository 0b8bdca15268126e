// Application layer - Ports and use cases
pub mod chart_converter;
pub mod dashboard_service;
pub mod discovery;
pub mod errors;
pub mod metrics_assembler;
pub mod metrics_backend;
pub mod reference_resolver;
pub mod template_repository;

#[cfg(test)]
pub mod testing;
