// [libs/infra/db-turso/src/rows.rs]
/*!
 * =================================================================
 * APARATO: ROW VALUE DECODERS (V12.0 - NULL SAFE)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: EXTRACCIÓN TOLERANTE DE ESCALARES DE FILAS LIBSQL
 * =================================================================
 */

use crate::errors::DbError;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Row, Value};

fn column_value(row: &Row, index: i32) -> Result<Value, DbError> {
    row.get_value(index).map_err(DbError::from)
}

/// Texto opcional: NULL y cadena vacía colapsan en None.
pub fn optional_text(row: &Row, index: i32) -> Result<Option<String>, DbError> {
    match column_value(row, index)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(if text.is_empty() { None } else { Some(text) }),
        other => Err(DbError::MappingError(format!(
            "column {} expected TEXT, found {:?}",
            index, other
        ))),
    }
}

pub fn required_text(row: &Row, index: i32) -> Result<String, DbError> {
    optional_text(row, index)?.ok_or_else(|| {
        DbError::MappingError(format!("column {} unexpectedly NULL", index))
    })
}

pub fn optional_integer(row: &Row, index: i32) -> Result<Option<i64>, DbError> {
    match column_value(row, index)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        other => Err(DbError::MappingError(format!(
            "column {} expected INTEGER, found {:?}",
            index, other
        ))),
    }
}

pub fn required_integer(row: &Row, index: i32) -> Result<i64, DbError> {
    optional_integer(row, index)?.ok_or_else(|| {
        DbError::MappingError(format!("column {} unexpectedly NULL", index))
    })
}

pub fn optional_real(row: &Row, index: i32) -> Result<Option<f64>, DbError> {
    match column_value(row, index)? {
        Value::Null => Ok(None),
        Value::Real(value) => Ok(Some(value)),
        // SQLite degrada reales enteros a INTEGER en algunos caminos.
        Value::Integer(value) => Ok(Some(value as f64)),
        other => Err(DbError::MappingError(format!(
            "column {} expected REAL, found {:?}",
            index, other
        ))),
    }
}

pub fn required_real(row: &Row, index: i32) -> Result<f64, DbError> {
    optional_real(row, index)?.ok_or_else(|| {
        DbError::MappingError(format!("column {} unexpectedly NULL", index))
    })
}

/// Fecha persistida como TEXT 'YYYY-MM-DD'.
pub fn optional_date(row: &Row, index: i32) -> Result<Option<NaiveDate>, DbError> {
    match optional_text(row, index)? {
        Some(raw_date) => NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
            .map(Some)
            .map_err(|parse_fault| {
                DbError::MappingError(format!("column {}: {}", index, parse_fault))
            }),
        None => Ok(None),
    }
}

/// Timestamp persistido como TEXT RFC3339.
pub fn optional_timestamp(row: &Row, index: i32) -> Result<Option<DateTime<Utc>>, DbError> {
    match optional_text(row, index)? {
        Some(raw_timestamp) => DateTime::parse_from_rfc3339(&raw_timestamp)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|parse_fault| {
                DbError::MappingError(format!("column {}: {}", index, parse_fault))
            }),
        None => Ok(None),
    }
}

pub fn boolean_from_integer(row: &Row, index: i32) -> Result<bool, DbError> {
    Ok(required_integer(row, index)? != 0)
}

/// Serialización de fecha al formato del Ledger.
pub fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|value| value.format("%Y-%m-%d").to_string())
}

/// Serialización de timestamp al formato del Ledger (RFC3339 en
/// segundos enteros; el parser de fechas de SQLite lo entiende).
pub fn timestamp_to_sql(timestamp: Option<DateTime<Utc>>) -> Option<String> {
    timestamp.map(|value| value.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
}
