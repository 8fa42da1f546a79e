use core::fmt;

use rust_decimal::Decimal;

/// A raw column value as returned by a host driver.
///
/// Drivers differ in how they surface sequence values (`int4`, `int8`,
/// `NUMBER`, or plain text on text protocols), so extraction accepts every
/// variant and converts it into the generator's [`NumericKind`].
///
/// [`NumericKind`]: crate::NumericKind
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Database NULL.
    Null,
    Int(i32),
    BigInt(i64),
    Decimal(Decimal),
    Text(String),
}

impl Value {
    /// Whether this is a database NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One result row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// A row holding `values` in column order.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// A row with a single column.
    pub fn single(value: impl Into<Value>) -> Self {
        Self {
            values: vec![value.into()],
        }
    }

    /// Column 1, the only column a batched sequence select produces.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// The value at zero-based `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
