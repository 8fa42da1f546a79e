use core::fmt;

use rust_decimal::Decimal;

use crate::id::NumericKind;

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A boxed driver failure as handed over by a host [`Connection`].
///
/// [`Connection`]: crate::Connection
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Coarse classification of every [`Error`].
///
/// Configuration errors are raised once at setup, execution and integrity
/// errors once per replenish attempt. None of them is retried internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid or missing generator configuration. Fatal to setup.
    Configuration,
    /// The borrowed connection or the batched statement failed.
    Execution,
    /// The database answered, but with something that cannot be an id batch.
    Integrity,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuration => "configuration",
            Self::Execution => "execution",
            Self::Integrity => "integrity",
        })
    }
}

/// All errors `batchseq` can produce.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The generator configuration is invalid (missing sequence name,
    /// non-positive fetch size, unsupported identifier type, ...).
    #[error("invalid generator configuration: {reason}")]
    Configuration { reason: String },

    /// The batched statement could not be prepared or executed.
    #[error("{message} [{sql}]")]
    Execution {
        message: String,
        sql: String,
        #[source]
        source: BoxError,
    },

    /// The batched statement returned a different number of rows than the
    /// fetch size it was bound to.
    #[error("expected {expected} values from {sequence} but got {actual}")]
    CountMismatch {
        sequence: String,
        expected: u32,
        actual: usize,
    },

    /// A fetched row held a database NULL where a sequence value was expected.
    #[error("sequence returned null")]
    NullValue,

    /// A fetched row had no columns.
    #[error("sequence row has no columns")]
    MissingColumn,

    /// A fetched value had a fractional part where an integer was required.
    #[error("sequence returned non-integral value {value} for {kind}")]
    NonIntegral { value: Decimal, kind: NumericKind },

    /// A fetched value does not fit the identifier type, or could not be read
    /// as a number at all.
    #[error("sequence value {value} cannot be represented as {kind}")]
    OutOfRange { value: String, kind: NumericKind },

    /// An identifier was requested before the generator was configured.
    #[error("generator has no sequence configured; configure it before requesting identifiers")]
    Unconfigured,
}

impl Error {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Wraps a driver failure together with the statement that failed.
    pub fn execution(
        source: impl Into<BoxError>,
        message: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        Self::Execution {
            message: message.into(),
            sql: sql.into(),
            source: source.into(),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } | Self::Unconfigured => ErrorKind::Configuration,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::CountMismatch { .. }
            | Self::NullValue
            | Self::MissingColumn
            | Self::NonIntegral { .. }
            | Self::OutOfRange { .. } => ErrorKind::Integrity,
        }
    }

    /// The statement text of an execution error.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_keeps_statement_text() {
        let err = Error::execution(
            "connection reset",
            "could not get next sequence value",
            "SELECT nextval('seq') FROM generate_series(1, ?)",
        );
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(
            err.sql(),
            Some("SELECT nextval('seq') FROM generate_series(1, ?)")
        );
        assert_eq!(
            err.to_string(),
            "could not get next sequence value [SELECT nextval('seq') FROM generate_series(1, ?)]"
        );
        let source = core::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("connection reset"));
    }

    #[test]
    fn count_mismatch_is_an_integrity_error() {
        let err = Error::CountMismatch {
            sequence: "seq_parent_id".into(),
            expected: 10,
            actual: 9,
        };
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert_eq!(
            err.to_string(),
            "expected 10 values from seq_parent_id but got 9"
        );
    }

    #[test]
    fn unconfigured_is_a_configuration_error() {
        assert_eq!(Error::Unconfigured.kind(), ErrorKind::Configuration);
        assert!(Error::configuration("no sequence name specified")
            .to_string()
            .contains("no sequence name specified"));
    }
}
