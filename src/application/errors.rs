// Error taxonomy for dashboard resolution
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("dashboard template {name} not found in scope {scope}")]
    NotFound { scope: String, name: String },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("dashboard template {name} not found in scope {scope}")]
    NotFound { scope: String, name: String },
    #[error(
        "cannot load dashboard {template} due to circular dependency, already loaded: {}",
        .chain.join(" -> ")
    )]
    CircularDependency { template: String, chain: Vec<String> },
    #[error("backend error: {0:#}")]
    Backend(anyhow::Error),
}

impl DashboardError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DashboardError::NotFound { .. })
    }
}

impl From<RepositoryError> for DashboardError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { scope, name } => DashboardError::NotFound { scope, name },
            RepositoryError::Backend(e) => DashboardError::Backend(e),
        }
    }
}
