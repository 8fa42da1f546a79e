use rust_decimal::Decimal;

use crate::{
    error::{Error, Result},
    id::{GeneratedId, NumericKind},
    value::{Row, Value},
};

/// Decodes column 1 of a fetched row into a [`GeneratedId`].
///
/// One variant per [`NumericKind`]; the set is closed, so the extractor is
/// picked once when the generator is built and never looked up again.
///
/// A NULL sequence value means the driver or engine misbehaved, and is always
/// an error. Integral kinds reject values with a fractional part instead of
/// truncating them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentifierExtractor {
    Integer,
    Long,
    BigInteger,
    BigDecimal,
}

impl IdentifierExtractor {
    /// The extractor decoding `kind`.
    pub const fn for_kind(kind: NumericKind) -> Self {
        match kind {
            NumericKind::Integer => Self::Integer,
            NumericKind::Long => Self::Long,
            NumericKind::BigInteger => Self::BigInteger,
            NumericKind::BigDecimal => Self::BigDecimal,
        }
    }

    /// The numeric kind this extractor produces.
    pub const fn kind(self) -> NumericKind {
        match self {
            Self::Integer => NumericKind::Integer,
            Self::Long => NumericKind::Long,
            Self::BigInteger => NumericKind::BigInteger,
            Self::BigDecimal => NumericKind::BigDecimal,
        }
    }

    /// Extracts the identifier in column 1 of `row`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingColumn`] if the row is empty
    /// - [`Error::NullValue`] if column 1 is NULL
    /// - [`Error::NonIntegral`] if an integral kind receives a fraction
    /// - [`Error::OutOfRange`] if the value does not fit or is not a number
    pub fn extract(self, row: &Row) -> Result<GeneratedId> {
        let value = row.first().ok_or(Error::MissingColumn)?;
        if value.is_null() {
            return Err(Error::NullValue);
        }
        match self {
            Self::Integer => {
                let v = self.integral(value)?;
                i32::try_from(v)
                    .map(GeneratedId::Integer)
                    .map_err(|_| self.out_of_range(value))
            }
            Self::Long => {
                let v = self.integral(value)?;
                i64::try_from(v)
                    .map(GeneratedId::Long)
                    .map_err(|_| self.out_of_range(value))
            }
            Self::BigInteger => self.integral(value).map(GeneratedId::BigInteger),
            Self::BigDecimal => self.decimal(value).map(GeneratedId::BigDecimal),
        }
    }

    fn integral(self, value: &Value) -> Result<i128> {
        match value {
            Value::Int(v) => Ok(i128::from(*v)),
            Value::BigInt(v) => Ok(i128::from(*v)),
            Value::Text(text) => match text.trim().parse::<i128>() {
                Ok(v) => Ok(v),
                Err(_) => self.decimal(value).and_then(|d| self.scale_zero(d)),
            },
            Value::Decimal(d) => self.scale_zero(*d),
            Value::Null => Err(Error::NullValue),
        }
    }

    fn decimal(self, value: &Value) -> Result<Decimal> {
        match value {
            Value::Int(v) => Ok(Decimal::from(*v)),
            Value::BigInt(v) => Ok(Decimal::from(*v)),
            Value::Decimal(d) => Ok(*d),
            Value::Text(text) => text
                .trim()
                .parse::<Decimal>()
                .map_err(|_| self.out_of_range(value)),
            Value::Null => Err(Error::NullValue),
        }
    }

    // `10.00` is integral, `10.5` is not.
    fn scale_zero(self, d: Decimal) -> Result<i128> {
        let normalized = d.normalize();
        if normalized.scale() != 0 {
            return Err(Error::NonIntegral {
                value: d,
                kind: self.kind(),
            });
        }
        Ok(normalized.mantissa())
    }

    fn out_of_range(self, value: &Value) -> Error {
        Error::OutOfRange {
            value: value.to_string(),
            kind: self.kind(),
        }
    }
}

impl From<NumericKind> for IdentifierExtractor {
    fn from(kind: NumericKind) -> Self {
        Self::for_kind(kind)
    }
}
