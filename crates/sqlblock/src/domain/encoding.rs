//! # Value Encoding
//!
//! The single place where entity fields become SQL literals.
//!
//! Validation happens when a `SqlValue` is constructed; rendering through
//! `SqlValue::write_literal` is then infallible. Every literal carries an
//! explicit type so the engine never has to guess one:
//!
//! | Kind      | Rendered as                          |
//! |-----------|--------------------------------------|
//! | `BigInt`  | `123`                                |
//! | `Numeric` | `'123'::numeric`                     |
//! | `Text`    | `E'it''s'::text`                     |
//! | `Bytes`   | `decode('deadbeef','hex')`           |
//! | `ByteaArray` | `ARRAY[decode(..),..]::bytea[]`   |
//! | `Null`    | `NULL::text`                         |

use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::domain::errors::EncodingError;

/// Column type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Numeric,
    Text,
    Bytea,
    ByteaArray,
}

impl SqlType {
    /// PostgreSQL type name.
    pub const fn name(self) -> &'static str {
        match self {
            SqlType::BigInt => "bigint",
            SqlType::Numeric => "numeric",
            SqlType::Text => "text",
            SqlType::Bytea => "bytea",
            SqlType::ByteaArray => "bytea[]",
        }
    }
}

/// A validated, typed column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    BigInt(i64),
    /// Digits only, arbitrary length.
    Numeric(String),
    Text(String),
    Bytes(Vec<u8>),
    ByteaArray(Vec<Vec<u8>>),
    Null(SqlType),
}

impl SqlValue {
    /// Unsigned integer that must fit a `BIGINT` column.
    pub fn bigint(field: &'static str, value: u64) -> Result<Self, EncodingError> {
        i64::try_from(value)
            .map(SqlValue::BigInt)
            .map_err(|_| EncodingError::OutOfRange { field, value })
    }

    /// Arbitrary-precision decimal. Never narrowed to a fixed-width integer.
    pub fn numeric(field: &'static str, value: &str) -> Result<Self, EncodingError> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EncodingError::InvalidDecimal {
                field,
                value: value.to_string(),
            });
        }
        Ok(SqlValue::Numeric(value.to_string()))
    }

    /// Text value. Empty strings are allowed; NUL bytes are not.
    pub fn text(field: &'static str, value: &str) -> Result<Self, EncodingError> {
        if value.contains('\0') {
            return Err(EncodingError::NulInText { field });
        }
        Ok(SqlValue::Text(value.to_string()))
    }

    /// Optional text, rendered as a typed `NULL` when absent.
    pub fn nullable_text(field: &'static str, value: Option<&str>) -> Result<Self, EncodingError> {
        match value {
            Some(v) => Self::text(field, v),
            None => Ok(SqlValue::Null(SqlType::Text)),
        }
    }

    /// Byte blob of any length.
    pub fn bytes(value: &[u8]) -> Self {
        SqlValue::Bytes(value.to_vec())
    }

    /// Ordered array of byte strings.
    pub fn bytea_array(values: &[Vec<u8>]) -> Self {
        SqlValue::ByteaArray(values.to_vec())
    }

    /// Type of this value.
    pub fn sql_type(&self) -> SqlType {
        match self {
            SqlValue::BigInt(_) => SqlType::BigInt,
            SqlValue::Numeric(_) => SqlType::Numeric,
            SqlValue::Text(_) => SqlType::Text,
            SqlValue::Bytes(_) => SqlType::Bytea,
            SqlValue::ByteaArray(_) => SqlType::ByteaArray,
            SqlValue::Null(ty) => *ty,
        }
    }

    /// Upper bound of the rendered literal length, for buffer pre-sizing.
    pub fn literal_len_hint(&self) -> usize {
        match self {
            SqlValue::BigInt(_) => 20,
            SqlValue::Numeric(s) => s.len() + 12,
            SqlValue::Text(s) => s.len() * 2 + 10,
            SqlValue::Bytes(b) => b.len() * 2 + 20,
            SqlValue::ByteaArray(items) => items.iter().map(|b| b.len() * 2 + 22).sum::<usize>() + 16,
            SqlValue::Null(_) => 16,
        }
    }

    /// Append this value as a typed SQL literal.
    pub fn write_literal(&self, out: &mut String) {
        match self {
            SqlValue::BigInt(v) => {
                let _ = write!(out, "{}", v);
            }
            SqlValue::Numeric(digits) => {
                out.push('\'');
                out.push_str(digits);
                out.push_str("'::numeric");
            }
            SqlValue::Text(text) => {
                write_escaped_text(text, out);
                out.push_str("::text");
            }
            SqlValue::Bytes(bytes) => write_bytea(bytes, out),
            SqlValue::ByteaArray(items) => {
                if items.is_empty() {
                    out.push_str("'{}'::bytea[]");
                    return;
                }
                out.push_str("ARRAY[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_bytea(item, out);
                }
                out.push_str("]::bytea[]");
            }
            SqlValue::Null(ty) => {
                out.push_str("NULL::");
                out.push_str(ty.name());
            }
        }
    }
}

/// `E'...'` string: behaves the same whatever `standard_conforming_strings` is.
fn write_escaped_text(text: &str, out: &mut String) {
    out.push_str("E'");
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
}

fn write_bytea(bytes: &[u8], out: &mut String) {
    out.push_str("decode('");
    out.push_str(&hex::encode(bytes));
    out.push_str("','hex')");
}

/// Append a double-quoted identifier.
pub fn write_ident(ident: &str, out: &mut String) {
    out.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Compare two non-negative decimal digit strings numerically.
pub fn compare_decimal(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
