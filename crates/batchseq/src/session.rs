//! The seams a host persistence layer implements.
//!
//! The generator needs three things from its host: the dialect of the
//! database, a connection it can borrow for one statement, and a way to turn
//! driver failures into [`Error`]s. Connections are released by dropping them;
//! the generator drops its connection before it releases its own lock.

use crate::{
    dialect::Dialect,
    error::{BoxError, Error},
    value::Row,
};

/// A host persistence session.
pub trait Session {
    /// A borrowed connection. Dropping it hands it back to the host.
    type Connection<'s>: Connection
    where
        Self: 's;

    /// The dialect of the database behind this session.
    fn dialect(&self) -> Dialect;

    /// Borrows a connection for one statement.
    ///
    /// # Errors
    ///
    /// Returns the driver error if no connection can be obtained.
    fn acquire(&self) -> Result<Self::Connection<'_>, BoxError>;

    /// Translates a driver failure into an [`Error`], keeping the statement
    /// that failed.
    fn convert_error(&self, source: BoxError, message: &str, sql: &str) -> Error {
        Error::execution(source, message, sql)
    }
}

/// A live connection able to run one parameterized query.
pub trait Connection {
    /// Result rows of a query.
    type Rows<'c>: Iterator<Item = Result<Row, BoxError>>
    where
        Self: 'c;

    /// Prepares `sql`, binds `bind` to its single positional parameter and
    /// executes it. `fetch_size` is a hint for how many rows to buffer per
    /// driver round trip.
    ///
    /// # Errors
    ///
    /// Returns the driver error if preparing or executing fails.
    fn query(&mut self, sql: &str, bind: i32, fetch_size: u32) -> Result<Self::Rows<'_>, BoxError>;
}
