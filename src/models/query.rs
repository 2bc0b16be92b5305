// Paginated, filtered, sorted list query shared by the HTTP layer and the repo.

use serde::{Deserialize, Serialize};

use super::{MetricFilter, MetricType};
use crate::error::Result;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    RecordedAt,
    CreatedAt,
    Value,
    ServiceId,
    MetricType,
}

impl SortField {
    /// Unknown names fall back to `recorded_at`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "created_at" => SortField::CreatedAt,
            "value" => SortField::Value,
            "service_id" => SortField::ServiceId,
            "metric_type" => SortField::MetricType,
            _ => SortField::RecordedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::RecordedAt => "recorded_at",
            SortField::CreatedAt => "created_at",
            SortField::Value => "value",
            SortField::ServiceId => "service_id",
            SortField::MetricType => "metric_type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    /// Only `asc` is ascending; anything else is `desc`.
    pub fn from_name(name: &str) -> Self {
        if name == "asc" { SortDir::Asc } else { SortDir::Desc }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Raw query string of `GET /api/metrics`. Numbers stay strings so garbage falls back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub service_id: Option<String>,
    pub metric_type: Option<String>,
    pub search: Option<String>,
}

/// Normalised list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u32,
    pub sort_by: SortField,
    pub sort_dir: SortDir,
    pub filter: MetricFilter,
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort_by: SortField::default(),
            sort_dir: SortDir::default(),
            filter: MetricFilter::default(),
            search: None,
        }
    }
}

impl ListQuery {
    /// limit outside 1..=100 becomes 20, negative or unparsable offset becomes 0.
    /// An unknown metric_type filter is an error rather than an empty page.
    pub fn from_params(params: ListParams) -> Result<Self> {
        let limit = params
            .limit
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|l| *l > 0 && *l <= MAX_LIMIT as i64)
            .map_or(DEFAULT_LIMIT, |l| l as u32);
        let offset = params
            .offset
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .map_or(0, |o| o.min(u32::MAX as i64) as u32);

        let metric_type = match non_empty(params.metric_type) {
            Some(name) => Some(name.parse::<MetricType>()?),
            None => None,
        };

        Ok(Self {
            limit,
            offset,
            sort_by: params
                .sort_by
                .as_deref()
                .map(SortField::from_name)
                .unwrap_or_default(),
            sort_dir: params
                .sort_dir
                .as_deref()
                .map(SortDir::from_name)
                .unwrap_or_default(),
            filter: MetricFilter {
                service_id: non_empty(params.service_id),
                metric_type,
            },
            search: non_empty(params.search),
        })
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// One page of results plus the total matching row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

/// Raw query string of `GET /api/metrics/chart`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub service_id: Option<String>,
    pub metric_type: Option<String>,
    pub bucket: Option<String>,
}
