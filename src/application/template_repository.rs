// Repository trait for dashboard template access
use crate::application::errors::RepositoryError;
use crate::domain::template::Template;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Get a single template, failing with NotFound when absent from the scope
    async fn get_template(&self, scope: &str, name: &str) -> Result<Template, RepositoryError>;

    /// Get every template of a scope, keyed by template name
    async fn get_all_templates(
        &self,
        scope: &str,
    ) -> Result<BTreeMap<String, Template>, RepositoryError>;
}
