//! An in-memory [`Session`] for demos, benchmarks and tests.
//!
//! Sequences are plain counters. A statement is resolved to its sequence by
//! comparing it against the batch select each registered sequence would
//! produce for the database's dialect, so a generator configured for the
//! wrong sequence or dialect fails just like against a real engine.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    vec,
};

use crate::{
    dialect::Dialect,
    error::BoxError,
    session::{Connection, Session},
    value::{Row, Value},
};

/// A failure to inject into the next query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// No connection can be acquired.
    Unavailable,
    /// The statement fails with the given driver message.
    Fail(String),
    /// The result set is missing this many trailing rows. Sequence values are
    /// still consumed.
    ShortBatch(usize),
    /// The row at this zero-based position is NULL.
    NullAt(usize),
}

/// An in-memory database holding named sequences.
#[derive(Clone, Debug)]
pub struct MemoryDatabase {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    dialect: Dialect,
    sequences: Mutex<HashMap<String, i64>>,
    faults: Mutex<VecDeque<Fault>>,
    round_trips: AtomicUsize,
    open_connections: AtomicUsize,
    released_connections: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryDatabase {
    /// Creates an empty database speaking `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            inner: Arc::new(Inner {
                dialect,
                sequences: Mutex::new(HashMap::new()),
                faults: Mutex::new(VecDeque::new()),
                round_trips: AtomicUsize::new(0),
                open_connections: AtomicUsize::new(0),
                released_connections: AtomicUsize::new(0),
            }),
        }
    }

    /// Registers a sequence starting at 1. `name` is the qualified name as
    /// rendered for the dialect, e.g. `public.seq_parent_id`.
    pub fn create_sequence(&self, name: impl Into<String>) {
        self.set_value(name, 0);
    }

    /// Sets the last issued value of a sequence, creating it if needed.
    pub fn set_value(&self, name: impl Into<String>, last: i64) {
        lock(&self.inner.sequences).insert(name.into(), last);
    }

    /// The last issued value of a sequence.
    pub fn current_value(&self, name: &str) -> Option<i64> {
        lock(&self.inner.sequences).get(name).copied()
    }

    /// Queues a fault for an upcoming query. Faults apply in FIFO order, one
    /// per query.
    pub fn inject(&self, fault: Fault) {
        lock(&self.inner.faults).push_back(fault);
    }

    /// Number of statements executed.
    pub fn round_trips(&self) -> usize {
        self.inner.round_trips.load(Ordering::SeqCst)
    }

    /// Connections currently borrowed.
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections.load(Ordering::SeqCst)
    }

    /// Connections handed back so far.
    pub fn released_connections(&self) -> usize {
        self.inner.released_connections.load(Ordering::SeqCst)
    }

    fn next_fault(&self) -> Option<Fault> {
        lock(&self.inner.faults).pop_front()
    }

    fn execute(&self, sql: &str, bind: i32) -> Result<Vec<Result<Row, BoxError>>, BoxError> {
        self.inner.round_trips.fetch_add(1, Ordering::SeqCst);

        #[cfg(feature = "tracing")]
        tracing::trace!(sql, bind, "executing batch select");

        let fault = match self.next_fault() {
            Some(Fault::Fail(message)) => return Err(message.into()),
            other => other,
        };
        let count = usize::try_from(bind)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| format!("row count must be positive, got {bind}"))?;

        let dialect = self.inner.dialect;
        let mut sequences = lock(&self.inner.sequences);
        let last = sequences
            .iter_mut()
            .find(|(name, _)| dialect.batch_select(&dialect.next_value_expression(name)) == sql)
            .map(|(_, last)| last)
            .ok_or_else(|| format!("no sequence matches statement: {sql}"))?;

        let mut rows = Vec::with_capacity(count);
        for position in 0..count {
            *last = last
                .checked_add(1)
                .ok_or_else(|| format!("sequence exceeded its maximum value {}", i64::MAX))?;
            let value = match fault {
                Some(Fault::NullAt(null_at)) if null_at == position => Value::Null,
                _ => Value::BigInt(*last),
            };
            rows.push(Ok(Row::single(value)));
        }
        if let Some(Fault::ShortBatch(missing)) = fault {
            rows.truncate(count.saturating_sub(missing));
        }
        Ok(rows)
    }
}

impl Session for MemoryDatabase {
    type Connection<'s>
        = MemoryConnection<'s>
    where
        Self: 's;

    fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    fn acquire(&self) -> Result<Self::Connection<'_>, BoxError> {
        {
            let mut faults = lock(&self.inner.faults);
            if faults.front() == Some(&Fault::Unavailable) {
                faults.pop_front();
                return Err("connection refused".into());
            }
        }
        self.inner.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection { db: self })
    }
}

/// A connection borrowed from a [`MemoryDatabase`].
#[derive(Debug)]
pub struct MemoryConnection<'s> {
    db: &'s MemoryDatabase,
}

impl Connection for MemoryConnection<'_> {
    type Rows<'c>
        = vec::IntoIter<Result<Row, BoxError>>
    where
        Self: 'c;

    fn query(&mut self, sql: &str, bind: i32, _fetch_size: u32) -> Result<Self::Rows<'_>, BoxError> {
        self.db.execute(sql, bind).map(Vec::into_iter)
    }
}

impl Drop for MemoryConnection<'_> {
    fn drop(&mut self) {
        self.db.inner.open_connections.fetch_sub(1, Ordering::SeqCst);
        self.db
            .inner
            .released_connections
            .fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BatchSequence, BatchSequenceGenerator, Error, ErrorKind, GeneratedId, NumericKind};

    #[test]
    fn serves_consecutive_values() {
        let db = MemoryDatabase::new(Dialect::Postgres);
        db.create_sequence("seq");
        let sql = Dialect::Postgres.batch_select("nextval('seq')");

        let mut conn = db.acquire().unwrap();
        let rows: Vec<_> = conn.query(&sql, 3, 3).unwrap().map(Result::unwrap).collect();
        assert_eq!(
            rows,
            vec![Row::single(1i64), Row::single(2i64), Row::single(3i64)]
        );
        drop(conn);

        assert_eq!(db.current_value("seq"), Some(3));
        assert_eq!(db.round_trips(), 1);
        assert_eq!(db.open_connections(), 0);
        assert_eq!(db.released_connections(), 1);
    }

    #[test]
    fn rejects_unknown_statements() {
        let db = MemoryDatabase::new(Dialect::Oracle);
        db.create_sequence("seq");
        let mut conn = db.acquire().unwrap();
        let err = conn
            .query("SELECT nextval('seq') FROM generate_series(1, ?)", 2, 2)
            .unwrap_err();
        assert!(err.to_string().contains("no sequence matches"));
    }

    #[test]
    fn applies_faults_in_order() {
        let db = MemoryDatabase::new(Dialect::H2);
        db.create_sequence("seq");
        db.inject(Fault::ShortBatch(1));
        db.inject(Fault::Unavailable);
        let sql = Dialect::H2.batch_select("next value for seq");

        let mut conn = db.acquire().unwrap();
        assert_eq!(conn.query(&sql, 4, 4).unwrap().count(), 3);
        drop(conn);
        assert_eq!(db.current_value("seq"), Some(4));

        assert!(db.acquire().is_err());
        assert!(db.acquire().is_ok());
    }

    #[test]
    fn exhausted_sequence_is_a_driver_error() {
        let db = MemoryDatabase::new(Dialect::Postgres);
        db.set_value("seq", i64::MAX - 1);
        let sql = Dialect::Postgres.batch_select("nextval('seq')");

        let mut conn = db.acquire().unwrap();
        let err = conn.query(&sql, 2, 2).unwrap_err();
        assert!(err.to_string().contains("exceeded its maximum value"));
    }

    fn faulted_generate(fault: Fault) -> (MemoryDatabase, BatchSequenceGenerator, Error) {
        let db = MemoryDatabase::new(Dialect::Postgres);
        db.create_sequence("seq");
        let generator = BatchSequenceGenerator::from_annotation(
            &BatchSequence::new("seq").with_fetch_size(3),
            NumericKind::Long,
        )
        .unwrap();
        db.inject(fault);
        let err = generator.generate(&db).unwrap_err();
        (db, generator, err)
    }

    const SELECT: &str = "SELECT nextval('seq') FROM generate_series(1, ?)";

    #[test]
    fn generator_reports_unavailable_connection() {
        let (db, generator, err) = faulted_generate(Fault::Unavailable);
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.sql(), Some(SELECT));
        assert_eq!(generator.pooled(), 0);
        assert_eq!(db.round_trips(), 0);
        assert_eq!(db.open_connections(), 0);
        assert_eq!(db.released_connections(), 0);

        assert_eq!(generator.generate(&db).unwrap(), GeneratedId::Long(1));
    }

    #[test]
    fn generator_reports_failed_statement() {
        let (db, generator, err) =
            faulted_generate(Fault::Fail("relation \"seq\" does not exist".into()));
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.sql(), Some(SELECT));
        assert_eq!(generator.pooled(), 0);
        assert_eq!(db.open_connections(), 0);
        assert_eq!(db.released_connections(), 1);
    }

    #[test]
    fn generator_discards_batch_with_null() {
        let (db, generator, err) = faulted_generate(Fault::NullAt(1));
        assert!(matches!(err, Error::NullValue));
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert_eq!(err.sql(), None);
        assert_eq!(generator.pooled(), 0);
        assert_eq!(db.open_connections(), 0);
        assert_eq!(db.released_connections(), 1);

        // the values of the discarded batch are gone
        assert_eq!(generator.generate(&db).unwrap(), GeneratedId::Long(4));
    }

    #[test]
    fn generator_rejects_short_batch() {
        let (db, generator, err) = faulted_generate(Fault::ShortBatch(1));
        assert!(matches!(
            err,
            Error::CountMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert_eq!(generator.pooled(), 0);
        assert_eq!(db.open_connections(), 0);
        assert_eq!(db.released_connections(), 1);
        assert_eq!(db.current_value("seq"), Some(3));
    }
}
