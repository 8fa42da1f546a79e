use core::{fmt, str::FromStr};

use rust_decimal::Decimal;

use crate::error::{Error, Result};

/// The numeric type of the identifier field a generator fills.
///
/// Fixed when the generator is built and never changes afterwards. It picks
/// the [`IdentifierExtractor`] used to decode fetched rows.
///
/// [`IdentifierExtractor`]: crate::IdentifierExtractor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NumericKind {
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    /// Arbitrary-precision integer, carried as `i128`.
    BigInteger,
    /// Arbitrary-precision decimal.
    BigDecimal,
}

impl NumericKind {
    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Long => "long",
            Self::BigInteger => "big_integer",
            Self::BigDecimal => "big_decimal",
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumericKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "i32" | "int4" => Self::Integer,
            "long" | "bigint" | "i64" | "int8" => Self::Long,
            "biginteger" | "big_integer" | "i128" => Self::BigInteger,
            "decimal" | "bigdecimal" | "big_decimal" | "numeric" => Self::BigDecimal,
            _ => {
                return Err(Error::configuration(format!(
                    "unsupported integral type: {s}"
                )));
            }
        };
        Ok(kind)
    }
}

/// One identifier handed out by a generator.
///
/// The variant always matches the generator's [`NumericKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeneratedId {
    Integer(i32),
    Long(i64),
    BigInteger(i128),
    BigDecimal(Decimal),
}

impl GeneratedId {
    /// The numeric kind of this id.
    pub const fn kind(&self) -> NumericKind {
        match self {
            Self::Integer(_) => NumericKind::Integer,
            Self::Long(_) => NumericKind::Long,
            Self::BigInteger(_) => NumericKind::BigInteger,
            Self::BigDecimal(_) => NumericKind::BigDecimal,
        }
    }

    /// Widens any integral id to `i128`. Decimals with a fractional part
    /// return `None`.
    pub fn to_i128(&self) -> Option<i128> {
        match *self {
            Self::Integer(v) => Some(i128::from(v)),
            Self::Long(v) => Some(i128::from(v)),
            Self::BigInteger(v) => Some(v),
            Self::BigDecimal(v) => {
                let v = v.normalize();
                (v.scale() == 0).then(|| v.mantissa())
            }
        }
    }
}

impl fmt::Display for GeneratedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::BigInteger(v) => write!(f, "{v}"),
            Self::BigDecimal(v) => write!(f, "{v}"),
        }
    }
}

/// A Rust type that can hold a generated identifier.
///
/// This is how a generator learns which [`NumericKind`] to decode: the host
/// names the Rust type of the mapped identifier field.
pub trait IdentifierType: Sized {
    const KIND: NumericKind;

    /// Converts an id produced for [`Self::KIND`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the id has a different kind that does
    /// not fit `Self`.
    fn from_generated(id: GeneratedId) -> Result<Self>;
}

fn mismatch(id: GeneratedId, kind: NumericKind) -> Error {
    Error::OutOfRange {
        value: id.to_string(),
        kind,
    }
}

impl IdentifierType for i32 {
    const KIND: NumericKind = NumericKind::Integer;

    fn from_generated(id: GeneratedId) -> Result<Self> {
        id.to_i128()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| mismatch(id, Self::KIND))
    }
}

impl IdentifierType for i64 {
    const KIND: NumericKind = NumericKind::Long;

    fn from_generated(id: GeneratedId) -> Result<Self> {
        id.to_i128()
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| mismatch(id, Self::KIND))
    }
}

impl IdentifierType for i128 {
    const KIND: NumericKind = NumericKind::BigInteger;

    fn from_generated(id: GeneratedId) -> Result<Self> {
        id.to_i128().ok_or_else(|| mismatch(id, Self::KIND))
    }
}

impl IdentifierType for Decimal {
    const KIND: NumericKind = NumericKind::BigDecimal;

    fn from_generated(id: GeneratedId) -> Result<Self> {
        match id {
            GeneratedId::Integer(v) => Ok(Decimal::from(v)),
            GeneratedId::Long(v) => Ok(Decimal::from(v)),
            GeneratedId::BigInteger(v) => {
                Decimal::try_from_i128_with_scale(v, 0).map_err(|_| mismatch(id, Self::KIND))
            }
            GeneratedId::BigDecimal(v) => Ok(v),
        }
    }
}

macro_rules! impl_try_from_generated {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<GeneratedId> for $ty {
                type Error = Error;

                fn try_from(id: GeneratedId) -> Result<Self> {
                    <$ty as IdentifierType>::from_generated(id)
                }
            }
        )*
    };
}

impl_try_from_generated!(i32, i64, i128, Decimal);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_names() {
        assert_eq!("Integer".parse::<NumericKind>().unwrap(), NumericKind::Integer);
        assert_eq!("bigint".parse::<NumericKind>().unwrap(), NumericKind::Long);
        assert_eq!("i128".parse::<NumericKind>().unwrap(), NumericKind::BigInteger);
        assert_eq!(" numeric ".parse::<NumericKind>().unwrap(), NumericKind::BigDecimal);
    }

    #[test]
    fn rejects_unsupported_type_names() {
        let err = "uuid".parse::<NumericKind>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        assert!(err.to_string().contains("unsupported integral type: uuid"));
    }

    #[test]
    fn identifier_types_name_their_kind() {
        assert_eq!(<i32 as IdentifierType>::KIND, NumericKind::Integer);
        assert_eq!(<i64 as IdentifierType>::KIND, NumericKind::Long);
        assert_eq!(<i128 as IdentifierType>::KIND, NumericKind::BigInteger);
        assert_eq!(<Decimal as IdentifierType>::KIND, NumericKind::BigDecimal);
    }

    #[test]
    fn converts_between_widths() {
        assert_eq!(i64::try_from(GeneratedId::Integer(7)).unwrap(), 7);
        assert_eq!(i32::try_from(GeneratedId::Long(7)).unwrap(), 7);
        assert!(i32::try_from(GeneratedId::Long(i64::from(i32::MAX) + 1)).is_err());
        assert_eq!(
            i128::try_from(GeneratedId::BigDecimal(Decimal::new(4200, 2))).unwrap(),
            42
        );
        assert!(i128::try_from(GeneratedId::BigDecimal(Decimal::new(4201, 2))).is_err());
        assert_eq!(
            Decimal::try_from(GeneratedId::BigInteger(12)).unwrap(),
            Decimal::from(12)
        );
    }

    #[test]
    fn displays_raw_value() {
        assert_eq!(GeneratedId::Long(1001).to_string(), "1001");
        assert_eq!(GeneratedId::BigDecimal(Decimal::new(15, 1)).to_string(), "1.5");
        assert_eq!(GeneratedId::BigInteger(3).kind(), NumericKind::BigInteger);
    }
}
