use core::num::NonZeroU32;
use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    name::SequenceIdentity,
};

/// Fetch size used when none is configured.
pub const DEFAULT_FETCH_SIZE: u32 = 10;

/// Parameter naming the sequence. Mandatory.
pub const SEQUENCE_PARAM: &str = "sequence";
/// Parameter with the catalog of the sequence.
pub const CATALOG_PARAM: &str = "catalog";
/// Parameter with the schema of the sequence.
pub const SCHEMA_PARAM: &str = "schema";
/// Parameter with the number of values fetched per round trip.
pub const FETCH_SIZE_PARAM: &str = "fetch_size";

/// Declarative generator configuration, as attached to an identifier field.
///
/// ```
/// use batchseq::{BatchConfiguration, BatchSequence};
///
/// let annotation = BatchSequence::new("seq_parent_id").with_fetch_size(50);
/// let config = BatchConfiguration::from_annotation(&annotation).unwrap();
/// assert_eq!(config.fetch_size().get(), 50);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchSequence {
    /// Sequence name, optionally qualified (`schema.name`).
    pub name: String,
    /// Catalog of the sequence, ignored for a qualified `name`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub catalog: Option<String>,
    /// Schema of the sequence, ignored for a qualified `name`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub schema: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_fetch_size", alias = "fetchSize")
    )]
    /// Values fetched per round trip. Validated when the configuration is
    /// built.
    pub fetch_size: i64,
}

#[cfg(feature = "serde")]
fn default_fetch_size() -> i64 {
    i64::from(DEFAULT_FETCH_SIZE)
}

impl BatchSequence {
    /// Declares `name` with no qualifiers and [`DEFAULT_FETCH_SIZE`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog: None,
            schema: None,
            fetch_size: i64::from(DEFAULT_FETCH_SIZE),
        }
    }

    /// Sets the catalog.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Sets the schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the number of values fetched per round trip.
    pub fn with_fetch_size(mut self, fetch_size: i64) -> Self {
        self.fetch_size = fetch_size;
        self
    }
}

/// Validated generator configuration: which sequence, and how many values to
/// fetch per round trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BatchConfiguration {
    sequence: SequenceIdentity,
    fetch_size: NonZeroU32,
}

impl BatchConfiguration {
    /// Creates a configuration from already validated parts.
    pub fn new(sequence: SequenceIdentity, fetch_size: NonZeroU32) -> Self {
        Self {
            sequence,
            fetch_size,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name is missing or the fetch
    /// size is not positive.
    pub fn from_annotation(annotation: &BatchSequence) -> Result<Self> {
        let sequence = SequenceIdentity::resolve(
            Some(annotation.name.as_str()),
            annotation.catalog.as_deref(),
            annotation.schema.as_deref(),
        )?;
        Ok(Self::new(sequence, validate_fetch_size(annotation.fetch_size)?))
    }

    /// Builds the configuration from `sequence`, `catalog`, `schema` and
    /// `fetch_size` parameters. A missing `fetch_size` means
    /// [`DEFAULT_FETCH_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the sequence is missing or the
    /// fetch size is not a positive integer.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| params.get(key).map(String::as_str);
        let sequence = SequenceIdentity::resolve(
            get(SEQUENCE_PARAM),
            get(CATALOG_PARAM),
            get(SCHEMA_PARAM),
        )?;
        let fetch_size = match get(FETCH_SIZE_PARAM).map(str::trim) {
            None | Some("") => i64::from(DEFAULT_FETCH_SIZE),
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                Error::configuration(format!("fetch size must be an integer, got {raw:?}"))
            })?,
        };
        Ok(Self::new(sequence, validate_fetch_size(fetch_size)?))
    }

    /// The sequence values are fetched from.
    pub fn sequence(&self) -> &SequenceIdentity {
        &self.sequence
    }

    /// Values fetched per round trip.
    pub fn fetch_size(&self) -> NonZeroU32 {
        self.fetch_size
    }
}

fn validate_fetch_size(fetch_size: i64) -> Result<NonZeroU32> {
    // The fetch size is bound as a 32-bit integer parameter.
    u32::try_from(fetch_size)
        .ok()
        .filter(|&v| i32::try_from(v).is_ok())
        .and_then(NonZeroU32::new)
        .ok_or_else(|| {
            Error::configuration(format!("fetch size must be positive, got {fetch_size}"))
        })
}
