//! Decoding helpers shared by the repository implementations.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for `count() ... GROUP ALL` queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn total(rows: Vec<CountRow>) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}

pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Corrupt(format!("invalid {field} UUID: {e}")))
}

pub(crate) fn parse_opt_uuid(value: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(&v, field)).transpose()
}

pub(crate) fn parse_enum<T>(value: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| DbError::Corrupt(e.to_string()))
}

pub(crate) fn parse_date(value: &str, field: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| DbError::Corrupt(format!("invalid {field} date: {e}")))
}

pub(crate) fn parse_opt_date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>, DbError> {
    value.map(|v| parse_date(&v, field)).transpose()
}

pub(crate) fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn opt_str<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// First row of a result or a `NotFound` for `entity`.
pub(crate) fn first<T>(rows: Vec<T>, entity: &str, id: impl ToString) -> Result<T, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::not_found(entity, id))
}
