use core::fmt;
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, OnceLock},
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::{BatchConfiguration, BatchSequence},
    dialect::Dialect,
    error::{BoxError, Error, Result},
    extractor::IdentifierExtractor,
    generator::{Mutex, MutexGuard},
    id::{GeneratedId, IdentifierType, NumericKind},
    name::SequenceIdentity,
    pool::IdentifierPool,
    session::{Connection, Session},
};

const FETCH_FAILED: &str = "could not get next sequence value";

/// A sequence-backed identifier generator that fetches many sequence values
/// in a single statement.
///
/// Values are fetched `fetch_size` at a time using a dialect-specific batch
/// select (see [`Dialect::batch_select`]), cached in an [`IdentifierPool`]
/// and handed out one per [`generate`](Self::generate) call.
///
/// ## Features
/// - ✅ Thread-safe; clones share the same pool
/// - ✅ One round trip per `fetch_size` identifiers
/// - ✅ Batches are all-or-nothing: a short or corrupt batch is never served
///
/// ## Lifecycle
/// A generator is either built configured ([`Self::new`],
/// [`Self::from_annotation`]) or built empty ([`Self::unconfigured`]) and
/// configured once later ([`Self::configure`]). Configuration is never
/// overwritten. The batch select is built on the first replenish from the
/// session's dialect, or eagerly with [`Self::initialize`].
///
/// ## Example
/// ```
/// # #[cfg(feature = "memory")] {
/// use batchseq::{BatchSequence, BatchSequenceGenerator, Dialect, MemoryDatabase, NumericKind};
///
/// let db = MemoryDatabase::new(Dialect::Postgres);
/// db.create_sequence("seq_parent_id");
///
/// let generator = BatchSequenceGenerator::from_annotation(
///     &BatchSequence::new("seq_parent_id").with_fetch_size(5),
///     NumericKind::Long,
/// )
/// .unwrap();
///
/// let id: i64 = generator.generate_as(&db).unwrap();
/// assert_eq!(id, 1);
/// assert_eq!(db.round_trips(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct BatchSequenceGenerator {
    inner: Arc<Inner>,
}

struct Inner {
    setup: OnceLock<Setup>,
    statement: OnceLock<Statement>,
    pool: Mutex<IdentifierPool>,
}

struct Setup {
    config: BatchConfiguration,
    extractor: IdentifierExtractor,
}

struct Statement {
    dialect: Dialect,
    select: String,
}

impl BatchSequenceGenerator {
    /// Creates a configured generator.
    pub fn new(config: BatchConfiguration, kind: NumericKind) -> Self {
        let generator = Self::unconfigured();
        generator.install(config, kind);
        generator
    }

    /// Creates a configured generator for identifiers of type `T`.
    pub fn for_type<T: IdentifierType>(config: BatchConfiguration) -> Self {
        Self::new(config, T::KIND)
    }

    /// Creates a generator from its declarative configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the sequence name is missing or the
    /// fetch size is not positive.
    pub fn from_annotation(annotation: &BatchSequence, kind: NumericKind) -> Result<Self> {
        BatchConfiguration::from_annotation(annotation).map(|config| Self::new(config, kind))
    }

    /// Creates a generator that must be [configured](Self::configure) before
    /// use.
    pub fn unconfigured() -> Self {
        Self {
            inner: Arc::new(Inner {
                setup: OnceLock::new(),
                statement: OnceLock::new(),
                pool: Mutex::new(IdentifierPool::empty()),
            }),
        }
    }

    /// Configures the generator from `sequence`, `catalog`, `schema` and
    /// `fetch_size` parameters.
    ///
    /// Returns `Ok(false)` without looking at `params` if the generator is
    /// already configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the parameters are invalid.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, params)))]
    pub fn configure(&self, params: &HashMap<String, String>, kind: NumericKind) -> Result<bool> {
        if self.is_configured() {
            #[cfg(feature = "tracing")]
            tracing::debug!(generator = %self, "already configured, ignoring parameters");
            return Ok(false);
        }
        let config = BatchConfiguration::from_params(params)?;
        Ok(self.install(config, kind))
    }

    /// Like [`Self::configure`] with an already validated configuration.
    pub fn configure_with(&self, config: BatchConfiguration, kind: NumericKind) -> bool {
        self.install(config, kind)
    }

    fn install(&self, config: BatchConfiguration, kind: NumericKind) -> bool {
        let setup = Setup {
            config,
            extractor: IdentifierExtractor::for_kind(kind),
        };
        self.inner.setup.set(setup).is_ok()
    }

    /// Builds the batch select for `dialect` ahead of the first request.
    ///
    /// Returns `false` if the statement was already built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unconfigured`] if no sequence is configured yet.
    pub fn initialize(&self, dialect: Dialect) -> Result<bool> {
        let setup = self.setup()?;
        let mut built = false;
        self.inner.statement.get_or_init(|| {
            built = true;
            Statement::build(setup, dialect)
        });
        Ok(built)
    }

    /// Whether a sequence has been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.setup.get().is_some()
    }

    /// The configuration, once set.
    pub fn config(&self) -> Option<&BatchConfiguration> {
        self.inner.setup.get().map(|setup| &setup.config)
    }

    /// The numeric kind of the generated identifiers, once configured.
    pub fn kind(&self) -> Option<NumericKind> {
        self.inner.setup.get().map(|setup| setup.extractor.kind())
    }

    /// The backing sequence, once configured.
    pub fn sequence(&self) -> Option<&SequenceIdentity> {
        self.config().map(BatchConfiguration::sequence)
    }

    /// Values fetched per round trip, once configured.
    pub fn fetch_size(&self) -> Option<NonZeroU32> {
        self.config().map(BatchConfiguration::fetch_size)
    }

    /// The batch select, once built.
    pub fn select(&self) -> Option<&str> {
        self.inner.statement.get().map(|s| s.select.as_str())
    }

    /// The dialect the batch select was built for.
    pub fn dialect(&self) -> Option<Dialect> {
        self.inner.statement.get().map(|s| s.dialect)
    }

    /// Generates one identifier, fetching a new batch first if the pool is
    /// exhausted.
    ///
    /// The pool check, the replenish and the pop all happen under one lock,
    /// so concurrent callers never fetch redundant batches and never receive
    /// the same identifier.
    ///
    /// # Errors
    ///
    /// - [`Error::Unconfigured`] if no sequence is configured
    /// - [`Error::Execution`] if the batch select fails
    /// - [`Error::CountMismatch`], [`Error::NullValue`], ... if the batch is
    ///   corrupt; the pool stays empty
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn generate<S: Session>(&self, session: &S) -> Result<GeneratedId> {
        let setup = self.setup()?;
        let statement = self
            .inner
            .statement
            .get_or_init(|| Statement::build(setup, session.dialect()));

        let mut pool = self.lock_pool();
        if pool.is_empty() {
            *pool = Self::replenish(setup, statement, session)?;
        }
        Ok(pool.next())
    }

    /// Generates one identifier converted to `T`.
    ///
    /// # Errors
    ///
    /// As [`Self::generate`], plus [`Error::OutOfRange`] if the value does
    /// not fit `T`.
    pub fn generate_as<T: IdentifierType, S: Session>(&self, session: &S) -> Result<T> {
        self.generate(session).and_then(T::from_generated)
    }

    /// Number of fetched identifiers not handed out yet.
    pub fn pooled(&self) -> usize {
        self.lock_pool().remaining()
    }

    // The pool is only replaced by a complete batch, so a host panic during a
    // replenish leaves it empty but consistent and the lock stays usable.
    fn lock_pool(&self) -> MutexGuard<'_, IdentifierPool> {
        #[cfg(feature = "parking-lot")]
        {
            self.inner.pool.lock()
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            self.inner
                .pool
                .lock()
                .unwrap_or_else(crate::generator::PoisonError::into_inner)
        }
    }

    fn replenish<S: Session>(
        setup: &Setup,
        statement: &Statement,
        session: &S,
    ) -> Result<IdentifierPool> {
        let fetch_size = setup.config.fetch_size().get();
        let sql = statement.select.as_str();
        let bind = i32::try_from(fetch_size).map_err(|_| {
            Error::configuration(format!("fetch size {fetch_size} exceeds a 32-bit bind value"))
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sequence = %setup.config.sequence(),
            fetch_size,
            dialect = %statement.dialect,
            "replenishing identifier pool"
        );

        let mut ids = Vec::with_capacity(fetch_size as usize);
        {
            let fail = |e: BoxError| session.convert_error(e, FETCH_FAILED, sql);
            let mut connection = session.acquire().map_err(fail)?;
            let rows = connection.query(sql, bind, fetch_size).map_err(fail)?;
            for row in rows {
                let row = row.map_err(fail)?;
                ids.push(setup.extractor.extract(&row)?);
            }
        }

        if ids.len() != fetch_size as usize {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                sequence = %setup.config.sequence(),
                expected = fetch_size,
                actual = ids.len(),
                "batch select returned the wrong number of rows"
            );
            return Err(Error::CountMismatch {
                sequence: setup.config.sequence().to_string(),
                expected: fetch_size,
                actual: ids.len(),
            });
        }
        Ok(IdentifierPool::for_list(ids))
    }

    /// Bulk inserts compute identifiers inside the statement itself.
    pub fn supports_bulk_insertion(&self) -> bool {
        true
    }

    /// The expression computing one fresh identifier inline, for use in a
    /// multi-row insert. Bypasses the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unconfigured`] if no sequence is configured.
    pub fn bulk_insertion_fragment(&self, dialect: Dialect) -> Result<String> {
        let sequence = self.setup()?.config.sequence().render(dialect);
        Ok(dialect.next_value_expression(&sequence))
    }

    /// DDL creating the backing sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unconfigured`] if no sequence is configured.
    pub fn create_sequence_ddl(&self, dialect: Dialect) -> Result<String> {
        let sequence = self.setup()?.config.sequence().render(dialect);
        Ok(dialect.create_sequence(&sequence))
    }

    /// DDL dropping the backing sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unconfigured`] if no sequence is configured.
    pub fn drop_sequence_ddl(&self, dialect: Dialect) -> Result<String> {
        let sequence = self.setup()?.config.sequence().render(dialect);
        Ok(dialect.drop_sequence(&sequence))
    }

    fn setup(&self) -> Result<&Setup> {
        self.inner.setup.get().ok_or(Error::Unconfigured)
    }
}

impl Statement {
    fn build(setup: &Setup, dialect: Dialect) -> Self {
        let sequence = setup.config.sequence().render(dialect);
        let select = dialect.batch_select(&dialect.next_value_expression(&sequence));
        Self { dialect, select }
    }
}

impl Default for BatchSequenceGenerator {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl fmt::Display for BatchSequenceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.config() {
            Some(config) => write!(f, "BatchSequenceGenerator({})", config.sequence()),
            None => f.write_str("BatchSequenceGenerator(<unconfigured>)"),
        }
    }
}

// for debugging only
impl fmt::Debug for BatchSequenceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
