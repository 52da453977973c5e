//! SQL values, column types and decoded rows.
//!
//! Every value bound to a statement and every column read back from the store
//! travels as a [`SqlValue`]. Record fields convert into values through
//! [`ToSqlValue`] and back through [`FromSqlValue`]; [`ColumnType`] ties the
//! two together and names the storage kind a dialect maps to a column type.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// A SQL value that can be bound as a parameter or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns a short name for the value's storage class.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOL",
            Self::Int(_) => "INTEGER",
            Self::Float(_) => "REAL",
            Self::Text(_) => "TEXT",
            Self::Blob(_) => "BLOB",
        }
    }

    /// Returns true for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Storage kind of a column type.
///
/// This is what a dialect inspects to pick a column type keyword, standing in
/// for a zero-valued sample of the field's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// Integers up to 32 bits.
    Integer,
    /// 64-bit integers.
    BigInt,
    /// `f32` / `f64`
    Float,
    /// `String`
    Text,
    /// `Vec<u8>`
    Blob,
    /// Timestamps.
    DateTime,
}

/// Errors raised while converting a stored value into a Rust type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// The row has no column with this name.
    #[error("column not found: {0}")]
    MissingColumn(String),

    /// The row has no column at this position.
    #[error("column index out of range: {0}")]
    MissingIndex(usize),

    /// The stored value has an incompatible storage class.
    #[error("expected {expected} value, found {found}")]
    Mismatch {
        /// Expected storage class.
        expected: &'static str,
        /// Storage class actually found.
        found: &'static str,
    },

    /// An integer does not fit the target type.
    #[error("integer {value} out of range for {target}")]
    OutOfRange {
        /// The stored integer.
        value: i64,
        /// Target Rust type.
        target: &'static str,
    },

    /// A text value could not be parsed as a timestamp.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Conversion of a named column failed.
    #[error("column {column}: {source}")]
    Column {
        /// Column being decoded.
        column: String,
        /// Underlying conversion failure.
        #[source]
        source: Box<ValueError>,
    },
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

/// Trait for types that can be rebuilt from a stored SQL value.
pub trait FromSqlValue: Sized {
    /// Converts a stored value into `Self`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] when the storage class or range does not fit.
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError>;
}

/// A Rust type usable as a record field.
pub trait ColumnType: ToSqlValue + FromSqlValue {
    /// Storage kind handed to the dialect.
    const KIND: ValueKind;
}

const fn mismatch(expected: &'static str, found: &SqlValue) -> ValueError {
    ValueError::Mismatch {
        expected,
        found: found.kind_name(),
    }
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            // SQLite stores booleans as 0/1
            SqlValue::Int(i) => Ok(i != 0),
            other => Err(mismatch("BOOL", &other)),
        }
    }
}

impl ColumnType for bool {
    const KIND: ValueKind = ValueKind::Bool;
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Int(i) => Ok(i),
            SqlValue::Bool(b) => Ok(Self::from(b)),
            other => Err(mismatch("INTEGER", &other)),
        }
    }
}

impl ColumnType for i64 {
    const KIND: ValueKind = ValueKind::BigInt;
}

macro_rules! impl_small_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }

            impl FromSqlValue for $ty {
                fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
                    let wide = i64::from_sql_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| ValueError::OutOfRange {
                        value: wide,
                        target: stringify!($ty),
                    })
                }
            }

            impl ColumnType for $ty {
                const KIND: ValueKind = ValueKind::Integer;
            }
        )+
    };
}

impl_small_int!(i8, i16, i32, u8, u16, u32);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl FromSqlValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(i) => Ok(i as Self),
            other => Err(mismatch("REAL", &other)),
        }
    }
}

impl ColumnType for f64 {
    const KIND: ValueKind = ValueKind::Float;
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl FromSqlValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        f64::from_sql_value(value).map(|f| f as Self)
    }
}

impl ColumnType for f32 {
    const KIND: ValueKind = ValueKind::Float;
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => Err(mismatch("TEXT", &other)),
        }
    }
}

impl ColumnType for String {
    const KIND: ValueKind = ValueKind::Text;
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("BLOB", &other)),
        }
    }
}

impl ColumnType for Vec<u8> {
    const KIND: ValueKind = ValueKind::Blob;
}

// Timestamps are stored as text: RFC 3339 for `DateTime<Utc>`, and
// `YYYY-MM-DD HH:MM:SS[.f]` for naive values (SQLite's own datetime format).
const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        let text = String::from_sql_value(value)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(&text, NAIVE_FORMAT).map(|dt| dt.and_utc()))
            .map_err(|_| ValueError::InvalidTimestamp(text))
    }
}

impl ColumnType for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::DateTime;
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        let text = String::from_sql_value(value)?;
        Self::parse_from_str(&text, NAIVE_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(&text).map(|dt| dt.naive_utc()))
            .map_err(|_| ValueError::InvalidTimestamp(text))
    }
}

impl ColumnType for NaiveDateTime {
    const KIND: ValueKind = ValueKind::DateTime;
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    const KIND: ValueKind = T::KIND;
}

/// One decoded result row.
///
/// Column names are shared between all rows of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row from shared column names and positional values.
    #[must_use]
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Column names in result order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in result order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw value of a column.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Decodes a column by name.
    ///
    /// # Errors
    ///
    /// Fails if the column is missing or its value does not convert to `T`.
    pub fn get<T: FromSqlValue>(&self, column: &str) -> Result<T, ValueError> {
        let value = self
            .value(column)
            .ok_or_else(|| ValueError::MissingColumn(column.to_string()))?;
        T::from_sql_value(value.clone()).map_err(|e| ValueError::Column {
            column: column.to_string(),
            source: Box::new(e),
        })
    }

    /// Decodes a column by position.
    ///
    /// # Errors
    ///
    /// Fails if the index is out of range or the value does not convert.
    pub fn get_index<T: FromSqlValue>(&self, idx: usize) -> Result<T, ValueError> {
        let value = self.values.get(idx).ok_or(ValueError::MissingIndex(idx))?;
        T::from_sql_value(value.clone())
    }

    /// Consumes the row, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(pairs: &[(&str, SqlValue)]) -> Row {
        let columns: Vec<String> = pairs.iter().map(|(c, _)| (*c).to_string()).collect();
        let values = pairs.iter().map(|(_, v)| v.clone()).collect();
        Row::new(columns.into(), values)
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(7_u32.to_sql_value(), SqlValue::Int(7));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!(
            "hello".to_sql_value(),
            SqlValue::Text(String::from("hello"))
        );
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(42_i32).to_sql_value(), SqlValue::Int(42));
    }

    #[test]
    fn test_small_int_out_of_range() {
        let err = u8::from_sql_value(SqlValue::Int(300)).unwrap_err();
        assert_eq!(
            err,
            ValueError::OutOfRange {
                value: 300,
                target: "u8"
            }
        );
        assert_eq!(i32::from_sql_value(SqlValue::Int(-5)).unwrap(), -5);
    }

    #[test]
    fn test_bool_from_integer() {
        assert!(bool::from_sql_value(SqlValue::Int(1)).unwrap());
        assert!(!bool::from_sql_value(SqlValue::Int(0)).unwrap());
    }

    #[test]
    fn test_kind_mismatch() {
        let err = String::from_sql_value(SqlValue::Int(3)).unwrap_err();
        assert_eq!(
            err,
            ValueError::Mismatch {
                expected: "TEXT",
                found: "INTEGER"
            }
        );
    }

    #[test]
    fn test_option_decoding() {
        assert_eq!(Option::<i64>::from_sql_value(SqlValue::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_sql_value(SqlValue::Int(9)).unwrap(),
            Some(9)
        );
    }

    #[test]
    fn test_column_kinds() {
        assert_eq!(<i32 as ColumnType>::KIND, ValueKind::Integer);
        assert_eq!(<i64 as ColumnType>::KIND, ValueKind::BigInt);
        assert_eq!(<String as ColumnType>::KIND, ValueKind::Text);
        assert_eq!(<Option<f32> as ColumnType>::KIND, ValueKind::Float);
        assert_eq!(<DateTime<Utc> as ColumnType>::KIND, ValueKind::DateTime);
    }

    #[test]
    fn test_datetime_text_storage() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let stored = ts.to_sql_value();
        assert_eq!(stored, SqlValue::Text("2024-03-01T12:30:00Z".to_string()));
        assert_eq!(DateTime::<Utc>::from_sql_value(stored).unwrap(), ts);

        // SQLite's datetime('now') format is accepted too
        let naive = SqlValue::Text("2024-03-01 12:30:00".to_string());
        assert_eq!(DateTime::<Utc>::from_sql_value(naive).unwrap(), ts);
    }

    #[test]
    fn test_invalid_timestamp() {
        let err = NaiveDateTime::from_sql_value(SqlValue::Text("yesterday".into())).unwrap_err();
        assert_eq!(err, ValueError::InvalidTimestamp("yesterday".into()));
    }

    #[test]
    fn test_row_get_by_name() {
        let row = row(&[
            ("name", SqlValue::Text("Tom".into())),
            ("age", SqlValue::Int(18)),
        ]);
        assert_eq!(row.get::<String>("name").unwrap(), "Tom");
        assert_eq!(row.get::<i32>("age").unwrap(), 18);
        assert_eq!(row.get_index::<i64>(1).unwrap(), 18);
        assert_eq!(row.columns(), &["name".to_string(), "age".to_string()]);
    }

    #[test]
    fn test_row_missing_column() {
        let row = row(&[("name", SqlValue::Text("Tom".into()))]);
        assert_eq!(
            row.get::<i32>("age").unwrap_err(),
            ValueError::MissingColumn("age".into())
        );
        assert_eq!(
            row.get_index::<i32>(4).unwrap_err(),
            ValueError::MissingIndex(4)
        );
    }

    #[test]
    fn test_row_decode_error_names_column() {
        let row = row(&[("age", SqlValue::Text("old".into()))]);
        let err = row.get::<i64>("age").unwrap_err();
        assert!(matches!(err, ValueError::Column { ref column, .. } if column == "age"));
    }
}
