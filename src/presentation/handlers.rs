// HTTP request handlers
use crate::domain::dashboard::{ResolvedDashboard, Runtime};
use crate::domain::query::{
    is_aggregator, is_duration, is_label_name, is_rate_func, DashboardQuery, MetricsQuery,
};
use crate::presentation::app_error::AppError;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub app: Option<String>,
    pub version: Option<String>,
    /// Comma-separated label names
    pub by_labels: Option<String>,
    /// Range in seconds, ending now
    pub duration: Option<i64>,
    pub step: Option<i64>,
    pub rate_interval: Option<String>,
    pub rate_func: Option<String>,
    /// Comma-separated quantiles, e.g. "0.5,0.99"
    pub quantiles: Option<String>,
    pub avg: Option<bool>,
    pub aggregator: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RuntimesParams {
    pub version: Option<String>,
    /// Comma-separated template names; disables discovery when set
    pub templates: Option<String>,
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds a dashboard query from request parameters
pub fn build_dashboard_query(
    namespace: &str,
    params: DashboardParams,
    default_aggregator: &str,
) -> Result<DashboardQuery, AppError> {
    let mut metrics = match params.duration {
        Some(duration) if duration <= 0 => {
            return Err(AppError::BadRequest(format!("invalid duration {}", duration)));
        }
        Some(duration) => MetricsQuery::last(duration),
        None => MetricsQuery::default(),
    };
    if let Some(step) = params.step {
        if step <= 0 {
            return Err(AppError::BadRequest(format!("invalid step {}", step)));
        }
        metrics.step_seconds = step;
    }
    if let Some(rate_interval) = params.rate_interval {
        if !is_duration(&rate_interval) {
            return Err(AppError::BadRequest(format!("invalid rateInterval {}", rate_interval)));
        }
        metrics.rate_interval = rate_interval;
    }
    if let Some(rate_func) = params.rate_func {
        if !is_rate_func(&rate_func) {
            return Err(AppError::BadRequest(format!("invalid rateFunc {}", rate_func)));
        }
        metrics.rate_func = rate_func;
    }
    metrics.quantiles = split_list(params.quantiles.as_deref());
    for quantile in &metrics.quantiles {
        match quantile.parse::<f64>() {
            Ok(q) if (0.0..=1.0).contains(&q) => {}
            _ => return Err(AppError::BadRequest(format!("invalid quantile {}", quantile))),
        }
    }
    if let Some(avg) = params.avg {
        metrics.avg = avg;
    }
    metrics.by_labels = split_list(params.by_labels.as_deref());
    if let Some(label) = metrics.by_labels.iter().find(|l| !is_label_name(l)) {
        return Err(AppError::BadRequest(format!("invalid label name {}", label)));
    }

    let mut query = DashboardQuery::new(namespace, params.app.as_deref().unwrap_or_default());
    query.metrics = metrics;
    query.version = params.version;
    query.raw_data_aggregator = params
        .aggregator
        .unwrap_or_else(|| default_aggregator.to_string());
    if !is_aggregator(&query.raw_data_aggregator) {
        return Err(AppError::BadRequest(format!(
            "invalid aggregator {}",
            query.raw_data_aggregator
        )));
    }
    query.fill_defaults();
    Ok(query)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Dashboard built from a template, filled with the workload's metrics
pub async fn get_dashboard(
    Path((namespace, template)): Path<(String, String)>,
    Query(params): Query<DashboardParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResolvedDashboard>, AppError> {
    let query = build_dashboard_query(&namespace, params, &state.raw_data_aggregator)?;
    let dashboard = state
        .dashboard_service
        .get_dashboard(&query, &template)
        .await?;
    Ok(Json(dashboard))
}

/// Runtimes (and their dashboards) applying to an app
pub async fn get_runtimes(
    Path((namespace, app)): Path<(String, String)>,
    Query(params): Query<RuntimesParams>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<Runtime>> {
    let templates = split_list(params.templates.as_deref());
    let version = params.version.as_deref().filter(|v| !v.is_empty());
    let runtimes = state
        .dashboard_service
        .get_runtime_dashboard_refs(&namespace, &app, version, &templates)
        .await;
    Json(runtimes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_dashboard_query() {
        let params = DashboardParams {
            app: Some("reviews".to_string()),
            version: Some("v2".to_string()),
            by_labels: Some("source_app, destination_app,".to_string()),
            duration: Some(600),
            step: Some(30),
            quantiles: Some("0.5,0.99".to_string()),
            avg: Some(false),
            ..Default::default()
        };

        let query = build_dashboard_query("bookinfo", params, "sum").unwrap();

        assert_eq!(query.namespace, "bookinfo");
        assert_eq!(query.app, "reviews");
        assert_eq!(query.version(), Some("v2"));
        assert_eq!(query.metrics.by_labels, vec!["source_app", "destination_app"]);
        assert_eq!((query.metrics.end - query.metrics.start).num_seconds(), 600);
        assert_eq!(query.metrics.step_seconds, 30);
        assert_eq!(query.metrics.histogram_stats(), vec!["0.5", "0.99"]);
        assert_eq!(query.raw_data_aggregator, "sum");
    }

    #[test]
    fn test_build_dashboard_query_overrides_aggregator() {
        let params = DashboardParams {
            aggregator: Some("avg".to_string()),
            ..Default::default()
        };
        let query = build_dashboard_query("ns", params, "sum").unwrap();
        assert_eq!(query.raw_data_aggregator, "avg");
        assert_eq!(query.app, "");
        assert!(query.metrics.avg);
    }

    #[test]
    fn test_build_dashboard_query_rejects_invalid_params() {
        let params = DashboardParams {
            step: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            build_dashboard_query("ns", params, "sum"),
            Err(AppError::BadRequest(_))
        ));

        let params = DashboardParams {
            quantiles: Some("0.5,high".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_dashboard_query("ns", params, "sum"),
            Err(AppError::BadRequest(_))
        ));
    }

    fn rejected(params: DashboardParams) -> bool {
        matches!(
            build_dashboard_query("ns", params, "sum"),
            Err(AppError::BadRequest(_))
        )
    }

    #[test]
    fn test_build_dashboard_query_rejects_promql_injection() {
        assert!(rejected(DashboardParams {
            aggregator: Some("topk(1000000,".to_string()),
            ..Default::default()
        }));
        assert!(rejected(DashboardParams {
            rate_func: Some("count_over_time(up[1h])) or sum(irate".to_string()),
            ..Default::default()
        }));
        assert!(rejected(DashboardParams {
            rate_interval: Some("1m]) or up[1m".to_string()),
            ..Default::default()
        }));
        assert!(rejected(DashboardParams {
            by_labels: Some("version,app) or vector(1".to_string()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_build_dashboard_query_accepts_known_functions() {
        let params = DashboardParams {
            rate_func: Some("irate".to_string()),
            rate_interval: Some("5m".to_string()),
            aggregator: Some("max".to_string()),
            ..Default::default()
        };
        let query = build_dashboard_query("ns", params, "sum").unwrap();
        assert_eq!(query.metrics.rate_func, "irate");
        assert_eq!(query.metrics.rate_interval, "5m");
        assert_eq!(query.raw_data_aggregator, "max");
    }

    #[test]
    fn test_split_list() {
        assert!(split_list(None).is_empty());
        assert_eq!(split_list(Some(" a,,b ")), vec!["a", "b"]);
    }
}
