//! Conversion of Postgres rows into JSON records.
//!
//! Integers, floats, booleans and JSON columns keep their JSON shape and arrays become
//! JSON arrays. Numeric, temporal, interval, money, bytea, uuid, text and enum values are
//! rendered as strings. A binary value of any other type becomes `null`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Number, Value};
use sqlx::postgres::types::{PgInterval, PgMoney};
use sqlx::postgres::{PgRow, PgTypeInfo, PgTypeKind, PgValueFormat, Postgres};
use sqlx::types::BigDecimal;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};
use tracing::warn;
use uuid::Uuid;

/// One row as an ordered column-name to value mapping.
pub type Record = Map<String, Value>;

/// Convert a row into a record, preserving column order.
pub fn record_from_row(row: &PgRow) -> Record {
    row.columns()
        .iter()
        .map(|column| {
            let value = column_value(row, column.ordinal(), column.type_info());
            (column.name().to_string(), value)
        })
        .collect()
}

fn column_value(row: &PgRow, index: usize, type_info: &PgTypeInfo) -> Value {
    let text_format = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => matches!(raw.format(), PgValueFormat::Text),
        Err(e) => {
            warn!("Could not read column {}: {}", index, e);
            return Value::Null;
        }
    };

    let type_name = type_info.name();
    let decoded = match type_name {
        "INT2" => row.try_get::<i16, _>(index).map(Value::from),
        "INT4" => row.try_get::<i32, _>(index).map(Value::from),
        "INT8" => row.try_get::<i64, _>(index).map(Value::from),
        "FLOAT4" => row
            .try_get::<f32, _>(index)
            .map(|v| float_value(f64::from(v))),
        "FLOAT8" => row.try_get::<f64, _>(index).map(float_value),
        "BOOL" => row.try_get::<bool, _>(index).map(Value::Bool),
        "JSON" | "JSONB" => row.try_get::<Value, _>(index),
        // Text-format values already carry their string form.
        _ if text_format => row.try_get_unchecked::<String, _>(index).map(Value::String),
        "NUMERIC" => row.try_get::<BigDecimal, _>(index).map(decimal_value),
        "DATE" => row.try_get::<NaiveDate, _>(index).map(date_value),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .map(|t| Value::String(t.to_string())),
        "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(index).map(timestamp_value),
        "TIMESTAMPTZ" => row.try_get::<DateTime<Utc>, _>(index).map(timestamptz_value),
        "UUID" => row.try_get::<Uuid, _>(index).map(uuid_value),
        "INTERVAL" => row
            .try_get::<PgInterval, _>(index)
            .map(|i| Value::String(interval_text(&i))),
        "MONEY" => row
            .try_get::<PgMoney, _>(index)
            .map(|m| Value::String(money_text(m))),
        "BYTEA" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|b| Value::String(bytea_text(&b))),
        name if name.ends_with("[]") => match array_value(row, index, name) {
            Some(decoded) => decoded,
            None => return unsupported(type_name, index),
        },
        _ if is_text_like(type_info) => {
            row.try_get_unchecked::<String, _>(index).map(Value::String)
        }
        _ => return unsupported(type_name, index),
    };

    decoded.unwrap_or_else(|e| {
        warn!("Could not decode {} column {}: {}", type_name, index, e);
        Value::Null
    })
}

/// Decode one-dimensional arrays of the scalar types above.
fn array_value(
    row: &PgRow,
    index: usize,
    type_name: &str,
) -> Option<Result<Value, sqlx::Error>> {
    let decoded = match type_name {
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => array_of(row, index, Value::String),
        "INT2[]" => array_of::<i16>(row, index, Value::from),
        "INT4[]" => array_of::<i32>(row, index, Value::from),
        "INT8[]" => array_of::<i64>(row, index, Value::from),
        "FLOAT4[]" => array_of(row, index, |v: f32| float_value(f64::from(v))),
        "FLOAT8[]" => array_of(row, index, float_value),
        "BOOL[]" => array_of(row, index, Value::Bool),
        "NUMERIC[]" => array_of(row, index, decimal_value),
        "DATE[]" => array_of(row, index, date_value),
        "TIMESTAMP[]" => array_of(row, index, timestamp_value),
        "TIMESTAMPTZ[]" => array_of(row, index, timestamptz_value),
        "UUID[]" => array_of(row, index, uuid_value),
        "JSON[]" | "JSONB[]" => array_of(row, index, |v: Value| v),
        _ => return None,
    };
    Some(decoded)
}

fn array_of<T>(row: &PgRow, index: usize, render: fn(T) -> Value) -> Result<Value, sqlx::Error>
where
    Vec<Option<T>>: for<'r> Decode<'r, Postgres> + Type<Postgres>,
{
    let items = row.try_get::<Vec<Option<T>>, _>(index)?;
    Ok(Value::Array(
        items
            .into_iter()
            .map(|item| item.map_or(Value::Null, render))
            .collect(),
    ))
}

fn is_text_like(type_info: &PgTypeInfo) -> bool {
    matches!(type_info.kind(), PgTypeKind::Enum(_))
        || matches!(
            type_info.name(),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN"
        )
}

fn unsupported(type_name: &str, index: usize) -> Value {
    warn!(
        "Unsupported column type {} at column {}; rendered as null",
        type_name, index
    );
    Value::Null
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(v.to_string()))
}

fn decimal_value(d: BigDecimal) -> Value {
    Value::String(d.to_string())
}

fn date_value(d: NaiveDate) -> Value {
    Value::String(d.to_string())
}

fn timestamp_value(t: NaiveDateTime) -> Value {
    Value::String(t.to_string())
}

fn timestamptz_value(t: DateTime<Utc>) -> Value {
    Value::String(t.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
}

fn uuid_value(u: Uuid) -> Value {
    Value::String(u.to_string())
}

/// Render an interval the way Postgres prints it, e.g. `1 year 2 mons 3 days 04:05:06`.
pub fn interval_text(interval: &PgInterval) -> String {
    let mut parts = Vec::new();
    push_unit(&mut parts, interval.months / 12, "year");
    push_unit(&mut parts, interval.months % 12, "mon");
    push_unit(&mut parts, interval.days, "day");

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let seconds = micros / 1_000_000;
        let mut time = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60
        );
        let fraction = micros % 1_000_000;
        if fraction != 0 {
            time.push_str(format!(".{:06}", fraction).trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

fn push_unit(parts: &mut Vec<String>, n: i32, unit: &str) {
    if n != 0 {
        let plural = if n == 1 { "" } else { "s" };
        parts.push(format!("{} {}{}", n, unit, plural));
    }
}

/// Render a money amount stored in cents, without a currency symbol.
pub fn money_text(money: PgMoney) -> String {
    let sign = if money.0 < 0 { "-" } else { "" };
    let cents = money.0.unsigned_abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

/// Render bytes in Postgres hex output format (`\x...`).
pub fn bytea_text(bytes: &[u8]) -> String {
    format!("\\x{}", hex::encode(bytes))
}
