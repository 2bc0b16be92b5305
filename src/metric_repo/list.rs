// SQL for the paginated list: shared WHERE clause, static ORDER BY columns.

use sqlx::{QueryBuilder, Sqlite};

use crate::models::ListQuery;

const SELECT_COLUMNS: &str =
    "SELECT id, service_id, metric_type, value, recorded_at, created_at FROM metrics";

pub(super) fn select(query: &ListQuery) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(SELECT_COLUMNS);
    push_where(&mut qb, query);
    // Column and direction come from closed enums, never from user text.
    qb.push(" ORDER BY ")
        .push(query.sort_by.column())
        .push(" ")
        .push(query.sort_dir.sql())
        .push(", id ")
        .push(query.sort_dir.sql());
    qb.push(" LIMIT ")
        .push_bind(i64::from(query.limit))
        .push(" OFFSET ")
        .push_bind(i64::from(query.offset));
    qb
}

pub(super) fn count(query: &ListQuery) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM metrics");
    push_where(&mut qb, query);
    qb
}

fn push_where(qb: &mut QueryBuilder<'static, Sqlite>, query: &ListQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(ref service_id) = query.filter.service_id {
        qb.push(" AND service_id = ").push_bind(service_id.clone());
    }
    if let Some(metric_type) = query.filter.metric_type {
        qb.push(" AND metric_type = ").push_bind(metric_type.as_str());
    }
    if let Some(ref search) = query.search {
        qb.push(" AND service_id LIKE ")
            .push_bind(format!("%{}%", search));
    }
}
