//! MySQL value and row conversion.

use mysql_async::Value;
use qgen_core::{Row, SqlValue};

/// Convert a driver value.
///
/// Text-protocol bytes become text when they are valid UTF-8; DATE and TIME
/// values are formatted as MySQL literals.
pub fn mysql_value_to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => SqlValue::Text(s),
            Err(e) => SqlValue::Bytes(e.into_bytes()),
        },
        Value::Int(v) => SqlValue::Int(v),
        Value::UInt(v) => SqlValue::UInt(v),
        Value::Float(v) => SqlValue::Float(f64::from(v)),
        Value::Double(v) => SqlValue::Float(v),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let mut s = format!("{year:04}-{month:02}-{day:02}");
            if (hour, minute, second, micros) != (0, 0, 0, 0) {
                s.push_str(&format!(" {hour:02}:{minute:02}:{second:02}"));
                if micros > 0 {
                    s.push_str(&format!(".{micros:06}"));
                }
            }
            SqlValue::Text(s)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            let mut s = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if micros > 0 {
                s.push_str(&format!(".{micros:06}"));
            }
            SqlValue::Text(s)
        }
    }
}

/// Convert a driver row, keeping column names and order.
pub fn mysql_row_to_row(row: mysql_async::Row) -> Row {
    let columns: Vec<String> = row
        .columns_ref()
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();
    let values = row.unwrap();
    Row::new(
        columns
            .into_iter()
            .zip(values.into_iter().map(mysql_value_to_sql_value))
            .collect(),
    )
}
