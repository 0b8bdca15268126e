// Dashboard service - Use cases for building dashboards and discovering runtimes
use crate::application::discovery::match_runtimes;
use crate::application::errors::{DashboardError, RepositoryError};
use crate::application::metrics_assembler::MetricsAssembler;
use crate::application::metrics_backend::MetricsBackend;
use crate::application::reference_resolver::ReferenceResolver;
use crate::application::template_repository::TemplateRepository;
use crate::domain::dashboard::{add_to_runtimes, ResolvedDashboard, Runtime};
use crate::domain::query::DashboardQuery;
use crate::domain::template::Template;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn TemplateRepository>,
    backend: Arc<dyn MetricsBackend>,
    resolver: ReferenceResolver,
    assembler: MetricsAssembler,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn TemplateRepository>,
        backend: Arc<dyn MetricsBackend>,
        global_scope: Option<String>,
        namespace_label: &str,
    ) -> Self {
        Self {
            resolver: ReferenceResolver::new(repository.clone(), global_scope),
            assembler: MetricsAssembler::new(backend.clone(), namespace_label),
            repository,
            backend,
        }
    }

    /// Resolves `template` and fills its charts with metrics of the queried workload
    pub async fn get_dashboard(
        &self,
        query: &DashboardQuery,
        template: &str,
    ) -> Result<ResolvedDashboard, DashboardError> {
        let resolved = self.resolver.resolve(&query.namespace, template).await?;
        Ok(self.assembler.assemble(&resolved, query).await)
    }

    /// Runtimes and their dashboards for a workload.
    /// Explicit template names skip discovery; without them discovery needs an app.
    pub async fn get_runtime_dashboard_refs(
        &self,
        namespace: &str,
        app: &str,
        version: Option<&str>,
        templates: &[String],
    ) -> Vec<Runtime> {
        if !templates.is_empty() {
            return self.build_runtimes_list(namespace, templates).await;
        }
        if !app.is_empty() {
            return self.discover_runtimes_list(namespace, app, version).await;
        }
        Vec::new()
    }

    async fn build_runtimes_list(&self, namespace: &str, templates: &[String]) -> Vec<Runtime> {
        let lookups = templates
            .iter()
            .map(|name| self.resolver.lookup(namespace, name));
        let loaded = join_all(lookups).await;

        let mut runtimes = Vec::new();
        for (name, result) in templates.iter().zip(loaded) {
            match result {
                Ok(template) => add_to_runtimes(&mut runtimes, &template),
                Err(e) => tracing::warn!(
                    "Cannot get dashboard {} in namespace {}: {}",
                    name,
                    namespace,
                    e
                ),
            }
        }
        runtimes
    }

    async fn discover_runtimes_list(
        &self,
        namespace: &str,
        app: &str,
        version: Option<&str>,
    ) -> Vec<Runtime> {
        let (metrics, templates) = tokio::join!(
            self.fetch_metric_names(namespace, app, version),
            self.load_all_templates(namespace)
        );

        match templates {
            Ok(templates) => match_runtimes(&metrics, &templates),
            Err(e) => {
                tracing::warn!(
                    "Runtimes discovery failed, cannot load dashboards in namespace {}: {}",
                    namespace,
                    e
                );
                Vec::new()
            }
        }
    }

    async fn fetch_metric_names(&self, namespace: &str, app: &str, version: Option<&str>) -> Vec<String> {
        let selector = self.assembler.build_selector(namespace, app, version);
        match self
            .backend
            .get_metric_names_for_selectors(std::slice::from_ref(&selector))
            .await
        {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(
                    "Runtimes discovery failed, cannot load metrics for labels {}: {:#}",
                    selector,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Templates of the global scope, overridden by same-name templates of `namespace`
    async fn load_all_templates(
        &self,
        namespace: &str,
    ) -> Result<BTreeMap<String, Template>, RepositoryError> {
        let mut all = BTreeMap::new();
        if let Some(global) = self.resolver.global_scope() {
            all.extend(self.repository.get_all_templates(global).await?);
            if global == namespace {
                return Ok(all);
            }
        }
        all.extend(self.repository.get_all_templates(namespace).await?);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        chart_item, fake_counter, include_item, FakeBackend, FakeRepository,
    };
    use crate::domain::template::DataType;

    fn service(repo: FakeRepository, backend: FakeBackend) -> DashboardService {
        DashboardService::new(
            Arc::new(repo),
            Arc::new(backend),
            Some("global".to_string()),
            "namespace",
        )
    }

    fn discoverable(name: &str, runtime: &str, discover_on: &str) -> Template {
        Template::new(name.to_string(), name.to_uppercase(), vec![])
            .with_discovery(runtime, discover_on)
    }

    #[tokio::test]
    async fn test_get_dashboard() {
        let repo = FakeRepository::new()
            .with("ns", "app", "App", vec![include_item("base"), chart_item("own", "m2", DataType::Raw)])
            .with("global", "base", "Base", vec![chart_item("base", "m1", DataType::Raw)]);
        let backend = FakeBackend::new()
            .with_series("m1", vec![fake_counter(1.0)])
            .with_error("m2", "boom");

        let dashboard = service(repo, backend)
            .get_dashboard(&DashboardQuery::new("ns", "reviews"), "app")
            .await
            .unwrap();

        assert_eq!(dashboard.title, "App");
        assert_eq!(dashboard.charts.len(), 2);
        assert_eq!(dashboard.charts[0].series.len(), 1);
        assert_eq!(dashboard.charts[1].error.as_deref(), Some("error in metric m2: boom"));
        assert_eq!(dashboard.aggregations[0].label, "version");
    }

    #[tokio::test]
    async fn test_get_dashboard_errors() {
        let repo = FakeRepository::new().with("ns", "loop", "Loop", vec![include_item("loop")]);
        let service = service(repo, FakeBackend::new());
        let query = DashboardQuery::new("ns", "reviews");

        let err = service.get_dashboard(&query, "missing").await.unwrap_err();
        assert!(err.is_not_found());

        let err = service.get_dashboard(&query, "loop").await.unwrap_err();
        assert!(matches!(err, DashboardError::CircularDependency { .. }));
    }

    #[tokio::test]
    async fn test_explicit_templates_skip_discovery() {
        let repo = FakeRepository::new()
            .with_template("ns", discoverable("vertx-server", "Vert.x", "m1"))
            .with_template("global", discoverable("vertx-client", "Vert.x", "m2"))
            .with_template("global", discoverable("go", "Go", "m3"));
        let backend = Arc::new(FakeBackend::new().with_metric_names(&["m3"]));
        let service = DashboardService::new(Arc::new(repo), backend.clone(), Some("global".to_string()), "");

        let templates = vec![
            "vertx-server".to_string(),
            "unknown".to_string(),
            "go".to_string(),
            "vertx-client".to_string(),
        ];
        let runtimes = service
            .get_runtime_dashboard_refs("ns", "reviews", None, &templates)
            .await;

        let names: Vec<&str> = runtimes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Vert.x", "Go"]);
        assert_eq!(runtimes[0].dashboard_refs.len(), 2);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_discovery_merges_scopes() {
        let repo = FakeRepository::new()
            .with_template("global", discoverable("go", "Go", "go_goroutines"))
            .with_template("global", discoverable("jvm", "JVM", "jvm_threads"))
            .with_template("ns", discoverable("jvm", "JVM (custom)", "jvm_threads"));
        let backend = Arc::new(FakeBackend::new().with_metric_names(&["jvm_threads"]));
        let service = DashboardService::new(Arc::new(repo), backend.clone(), Some("global".to_string()), "");

        let runtimes = service
            .get_runtime_dashboard_refs("ns", "reviews", Some("v1"), &[])
            .await;

        assert_eq!(runtimes.len(), 1);
        assert_eq!(runtimes[0].name, "JVM (custom)");
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].selector,
            "{namespace=\"ns\",app=\"reviews\",version=\"v1\"}"
        );
    }

    #[tokio::test]
    async fn test_discovery_degrades_on_metric_names_error() {
        let repo = FakeRepository::new().with_template("ns", discoverable("go", "Go", "go_goroutines"));
        let backend = FakeBackend::new().with_metric_names_error("prometheus down");

        let runtimes = service(repo, backend)
            .get_runtime_dashboard_refs("ns", "reviews", None, &[])
            .await;

        assert!(runtimes.is_empty());
    }

    #[tokio::test]
    async fn test_discovery_degrades_on_template_error() {
        let repo = FakeRepository::new()
            .with_template("ns", discoverable("go", "Go", "go_goroutines"))
            .failing("global");
        let backend = FakeBackend::new().with_metric_names(&["go_goroutines"]);

        let runtimes = service(repo, backend)
            .get_runtime_dashboard_refs("ns", "reviews", None, &[])
            .await;

        assert!(runtimes.is_empty());
    }

    #[tokio::test]
    async fn test_no_app_no_runtimes() {
        let repo = FakeRepository::new().with_template("ns", discoverable("go", "Go", "go_goroutines"));
        let backend = Arc::new(FakeBackend::new().with_metric_names(&["go_goroutines"]));
        let service = DashboardService::new(Arc::new(repo), backend.clone(), None, "");

        assert!(service.get_runtime_dashboard_refs("ns", "", None, &[]).await.is_empty());
        assert!(backend.calls().is_empty());
    }
}
