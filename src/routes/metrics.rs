// /api/metrics: create, paginated list, aggregated chart data

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};

use super::AppState;
use super::response::{ApiError, Data};
use crate::aggregation;
use crate::error::Error;
use crate::models::{
    AggregatedMetric, BucketGranularity, ChartParams, CreateMetricRequest, ListParams, ListQuery,
    MetricFilter, MetricType, Page, StoredMetric,
};

/// Window used by the chart endpoint when `from` or `to` is missing.
const DEFAULT_CHART_WINDOW_HOURS: i64 = 24;

/// POST /api/metrics: store one sample; a missing timestamp means now.
pub(super) async fn create_handler(
    State(state): State<AppState>,
    body: Result<Json<CreateMetricRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Data<StoredMetric>>), ApiError> {
    let Json(req) = body.map_err(|e| {
        tracing::debug!(error = %e, "rejected metric body");
        ApiError::bad_request("invalid request body")
    })?;
    let sample = req.into_sample(Utc::now())?;

    let stored = state.repo.insert(&sample).await.map_err(|e| {
        tracing::error!(error = %e, operation = "insert_metric", "failed to create metric");
        ApiError::internal("failed to create metric")
    })?;

    tracing::debug!(
        id = stored.id,
        service_id = %stored.service_id,
        metric_type = %stored.metric_type,
        value = stored.value,
        unit = stored.metric_type.unit(),
        "metric created"
    );
    Ok((StatusCode::CREATED, Json(Data::new(stored))))
}

/// GET /api/metrics: paginated, filtered, sorted list.
pub(super) async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<StoredMetric>>, ApiError> {
    let query = ListQuery::from_params(params)?;
    let page = state.repo.list(&query).await.map_err(|e| {
        tracing::error!(error = %e, operation = "list_metrics", "failed to list metrics");
        ApiError::internal("failed to list metrics")
    })?;
    Ok(Json(page))
}

/// GET /api/metrics/chart: aggregated buckets for [from, to).
pub(super) async fn chart_handler(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Data<Vec<AggregatedMetric>>>, ApiError> {
    let (from, to) = chart_window(&params, Utc::now())?;
    if from > to {
        return Err(Error::InvalidRange { from, to }.into());
    }

    let granularity = params
        .bucket
        .as_deref()
        .and_then(BucketGranularity::from_name)
        .unwrap_or_else(|| BucketGranularity::for_window(to - from));

    let metric_type = match params.metric_type.as_deref().filter(|s| !s.is_empty()) {
        Some(name) => Some(name.parse::<MetricType>()?),
        None => None,
    };
    let filter = MetricFilter {
        service_id: params.service_id.filter(|s| !s.is_empty()),
        metric_type,
    };

    let samples = state
        .repo
        .get_in_range(from, to, &filter)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, operation = "get_in_range", "failed to load samples");
            ApiError::internal("failed to get chart data")
        })?;
    let sample_count = samples.len();

    let timeout = Duration::from_millis(state.config.server.chart_timeout_ms);
    let task = tokio::task::spawn_blocking(move || {
        aggregation::aggregate_with_report(&samples, from, to, granularity, &filter)
    });
    let report = match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            tracing::warn!(
                samples = sample_count,
                timeout_ms = state.config.server.chart_timeout_ms,
                "chart aggregation timed out"
            );
            return Err(ApiError::unavailable("chart aggregation timed out"));
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, operation = "aggregate", "aggregation task failed");
            return Err(ApiError::internal("failed to get chart data"));
        }
        Ok(Ok(result)) => result?,
    };

    if report.skipped > 0 {
        tracing::warn!(skipped = report.skipped, "malformed samples excluded from chart");
    }
    tracing::debug!(
        samples = sample_count,
        buckets = report.metrics.len(),
        ?granularity,
        "chart aggregated"
    );
    Ok(Json(Data::new(report.metrics)))
}

/// RFC 3339 `from`/`to`; if either is missing the window is the last 24 hours.
fn chart_window(
    params: &ChartParams,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let (Some(from), Some(to)) = (
        params.from.as_deref().filter(|s| !s.is_empty()),
        params.to.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Ok((now - chrono::Duration::hours(DEFAULT_CHART_WINDOW_HOURS), now));
    };
    let from = DateTime::parse_from_rfc3339(from)
        .map_err(|_| ApiError::bad_request("invalid 'from' time format, use RFC3339"))?;
    let to = DateTime::parse_from_rfc3339(to)
        .map_err(|_| ApiError::bad_request("invalid 'to' time format, use RFC3339"))?;
    Ok((from.with_timezone(&Utc), to.with_timezone(&Utc)))
}
