// Reference resolver - Template lookup with scope override and include expansion
use crate::application::errors::{DashboardError, RepositoryError};
use crate::application::template_repository::TemplateRepository;
use crate::domain::template::{IncludeRef, Item, Template};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReferenceResolver {
    repository: Arc<dyn TemplateRepository>,
    global_scope: Option<String>,
}

impl ReferenceResolver {
    pub fn new(repository: Arc<dyn TemplateRepository>, global_scope: Option<String>) -> Self {
        Self {
            repository,
            global_scope: global_scope.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn global_scope(&self) -> Option<&str> {
        self.global_scope.as_deref()
    }

    /// Looks a template up in `scope`, falling back to the global scope when absent.
    /// Templates in the specific scope override global ones with the same name.
    pub async fn lookup(&self, scope: &str, name: &str) -> Result<Template, RepositoryError> {
        match self.repository.get_template(scope, name).await {
            Err(RepositoryError::NotFound { .. }) if self.falls_back_from(scope) => {
                let global = self.global_scope.as_deref().unwrap_or_default();
                tracing::debug!("Template {} not in scope {}, trying {}", name, scope, global);
                self.repository.get_template(global, name).await
            }
            other => other,
        }
    }

    fn falls_back_from(&self, scope: &str) -> bool {
        matches!(&self.global_scope, Some(global) if global != scope)
    }

    /// Loads a template and flattens all of its includes
    pub async fn resolve(&self, scope: &str, name: &str) -> Result<Template, DashboardError> {
        let mut path = Vec::new();
        self.load_and_resolve(scope, name, &mut path).await
    }

    fn load_and_resolve<'a>(
        &'a self,
        scope: &'a str,
        name: &'a str,
        path: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Result<Template, DashboardError>> {
        async move {
            // The name joins the path before its own includes load
            if path.iter().any(|loaded| loaded == name) {
                return Err(DashboardError::CircularDependency {
                    template: name.to_string(),
                    chain: path.clone(),
                });
            }
            path.push(name.to_string());

            let template = self.lookup(scope, name).await?;
            let resolved = self.resolve_items(scope, &template, path).await;

            path.pop();
            resolved.map(|items| template.with_items(items))
        }
        .boxed()
    }

    async fn resolve_items(
        &self,
        scope: &str,
        template: &Template,
        path: &mut Vec<String>,
    ) -> Result<Vec<Item>, DashboardError> {
        let mut resolved = Vec::with_capacity(template.items.len());
        for item in &template.items {
            let reference = match item {
                Item::Chart(_) => {
                    resolved.push(item.clone());
                    continue;
                }
                Item::Include(reference) => reference,
            };
            let Some(include) = IncludeRef::parse(reference) else {
                continue;
            };

            let composed = self.load_and_resolve(scope, &include.template, path).await?;
            match &include.chart {
                Some(chart_name) => {
                    let selected = composed.items.into_iter().find(
                        |candidate| matches!(candidate, Item::Chart(chart) if &chart.name == chart_name),
                    );
                    if selected.is_none() {
                        tracing::debug!(
                            "Chart {} not found in template {}, include ignored",
                            chart_name,
                            include.template
                        );
                    }
                    resolved.extend(selected);
                }
                None => resolved.extend(composed.items),
            }
        }
        Ok(resolved)
    }
}
