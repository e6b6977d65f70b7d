//! Country read queries.

use sqlx_core::query_as::{QueryAs, query_as};
use sqlx_core::query_scalar::{QueryScalar, query_scalar};
use sqlx_postgres::{PgArguments, PgPool, Postgres};
use tracing::warn;

use wayfare_storage::{Country, CountryField, OrderBy, Predicate, StoreError, Window};

use super::filter::{BuiltQuery, SqlValue, compile_predicate};
use crate::error::query_error;
use crate::schema::COUNTRIES_TABLE;

/// Column list shared by every query returning full rows.
const COUNTRY_COLUMNS: &str = "code, code3, name, official_name, capital, continent, region, \
     languages, currencies, calling_codes, is_popular, flag, latitude, longitude";

type CountryRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Vec<String>,
    Vec<String>,
    Vec<String>,
    bool,
    String,
    f64,
    f64,
);

fn row_to_country(row: CountryRow) -> Country {
    let (
        code,
        code3,
        name,
        official_name,
        capital,
        continent,
        region,
        languages,
        currencies,
        calling_codes,
        is_popular,
        flag,
        latitude,
        longitude,
    ) = row;
    Country {
        code,
        code3,
        name,
        official_name,
        capital,
        continent,
        region,
        languages,
        currencies,
        calling_codes,
        is_popular,
        flag,
        latitude,
        longitude,
    }
}

/// Counts rows matching the predicate.
pub async fn count(pool: &PgPool, predicate: &Predicate) -> Result<u64, StoreError> {
    let mut query = BuiltQuery::default();
    let condition = compile_predicate(predicate, &mut query);
    query.sql = format!("SELECT COUNT(*) FROM {COUNTRIES_TABLE} WHERE {condition}");

    let total: i64 = query_scalar::<Postgres, i64>(&query.sql)
        .bind_all_params(&query.params)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, sql = %query.sql, "Count query failed");
            query_error("count", e)
        })?;

    Ok(total.max(0) as u64)
}

/// Fetches a window of rows matching the predicate in the requested order.
///
/// `code` is appended as a tie-breaker so pages stay stable when names collide.
pub async fn find_many(
    pool: &PgPool,
    predicate: &Predicate,
    order: OrderBy,
    window: Window,
) -> Result<Vec<Country>, StoreError> {
    let mut query = BuiltQuery::default();
    let condition = compile_predicate(predicate, &mut query);

    let mut sql = format!(
        "SELECT {COUNTRY_COLUMNS} FROM {COUNTRIES_TABLE} WHERE {condition} ORDER BY {} ASC, code ASC",
        order.field.column()
    );
    if let Some(limit) = window.limit {
        let placeholder = query.push_param(SqlValue::Integer(limit as i64));
        sql.push_str(&format!(" LIMIT {placeholder}"));
    }
    if window.offset > 0 {
        let placeholder = query.push_param(SqlValue::Integer(window.offset as i64));
        sql.push_str(&format!(" OFFSET {placeholder}"));
    }
    query.sql = sql;

    let rows: Vec<CountryRow> = query_as::<Postgres, CountryRow>(&query.sql)
        .bind_all_params(&query.params)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, sql = %query.sql, "Country page query failed");
            query_error("find_many", e)
        })?;

    Ok(rows.into_iter().map(row_to_country).collect())
}

/// Fetches the first row (by name) matching the predicate.
pub async fn find_first(pool: &PgPool, predicate: &Predicate) -> Result<Option<Country>, StoreError> {
    let mut query = BuiltQuery::default();
    let condition = compile_predicate(predicate, &mut query);
    query.sql = format!(
        "SELECT {COUNTRY_COLUMNS} FROM {COUNTRIES_TABLE} WHERE {condition} ORDER BY name ASC, code ASC LIMIT 1"
    );

    let row: Option<CountryRow> = query_as::<Postgres, CountryRow>(&query.sql)
        .bind_all_params(&query.params)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, sql = %query.sql, "Country lookup query failed");
            query_error("find_first", e)
        })?;

    Ok(row.map(row_to_country))
}

/// Counts rows per distinct value of a column, ordered by value.
pub async fn group_by_count(
    pool: &PgPool,
    field: CountryField,
) -> Result<Vec<(String, u64)>, StoreError> {
    let column = field.column();
    let sql = format!(
        "SELECT {column}, COUNT(*) FROM {COUNTRIES_TABLE} GROUP BY {column} ORDER BY {column} ASC"
    );

    let rows: Vec<(String, i64)> = query_as::<Postgres, (String, i64)>(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, sql = %sql, "Grouped count query failed");
            query_error("group_by_count", e)
        })?;

    Ok(rows
        .into_iter()
        .map(|(value, total)| (value, total.max(0) as u64))
        .collect())
}

/// Helper trait to bind all params to a query.
trait BindAllParams<'q> {
    fn bind_all_params(self, params: &'q [SqlValue]) -> Self;
}

impl<'q> BindAllParams<'q> for QueryAs<'q, Postgres, CountryRow, PgArguments> {
    fn bind_all_params(mut self, params: &'q [SqlValue]) -> Self {
        for param in params {
            self = match param {
                SqlValue::Text(s) => self.bind(s.as_str()),
                SqlValue::Integer(i) => self.bind(*i),
                SqlValue::Boolean(b) => self.bind(*b),
            };
        }
        self
    }
}

impl<'q> BindAllParams<'q> for QueryScalar<'q, Postgres, i64, PgArguments> {
    fn bind_all_params(mut self, params: &'q [SqlValue]) -> Self {
        for param in params {
            self = match param {
                SqlValue::Text(s) => self.bind(s.as_str()),
                SqlValue::Integer(i) => self.bind(*i),
                SqlValue::Boolean(b) => self.bind(*b),
            };
        }
        self
    }
}
