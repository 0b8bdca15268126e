// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_template_repository;
pub mod prometheus_backend;
