//! SQL dialects and the per-dialect batch select.
//!
//! Every batch select solves the same problem: materialize `K` rows with
//! whatever row generator the engine offers, then evaluate one
//! next-value expression per row, so that one round trip yields `K` sequence
//! values. The single `?` placeholder is bound to `K`.
//!
//! | dialect    | row generator                                     |
//! |------------|---------------------------------------------------|
//! | Oracle     | `CONNECT BY rownum <= ?` on `dual`                |
//! | SQL Server | non-recursive CTE, next value outside the CTE     |
//! | DB2        | as SQL Server, anchor row from `(VALUES 1)`       |
//! | HSQLDB     | `UNNEST(SEQUENCE_ARRAY(1, ?, 1))`                 |
//! | PostgreSQL | `generate_series(1, ?)`                           |
//! | others     | `WITH RECURSIVE` CTE                              |

use core::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// The SQL flavor of the database a generator talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    Oracle,
    SqlServer,
    Db2,
    Hsqldb,
    Postgres,
    H2,
    MariaDb,
    Firebird,
    /// Any engine with sequences and `WITH RECURSIVE`.
    Generic,
}

impl Dialect {
    pub const ALL: [Dialect; 9] = [
        Self::Oracle,
        Self::SqlServer,
        Self::Db2,
        Self::Hsqldb,
        Self::Postgres,
        Self::H2,
        Self::MariaDb,
        Self::Firebird,
        Self::Generic,
    ];

    /// Short lowercase key, as accepted by `FromStr`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::SqlServer => "sqlserver",
            Self::Db2 => "db2",
            Self::Hsqldb => "hsqldb",
            Self::Postgres => "postgres",
            Self::H2 => "h2",
            Self::MariaDb => "mariadb",
            Self::Firebird => "firebird",
            Self::Generic => "generic",
        }
    }

    /// Builds the statement fetching `?` values of a sequence at once.
    ///
    /// `next_value` is the single-value expression for the sequence, usually
    /// from [`Self::next_value_expression`].
    pub fn batch_select(self, next_value: &str) -> String {
        match self {
            Self::Oracle => {
                format!("SELECT {next_value} FROM dual CONNECT BY rownum <= ?")
            }
            // No RECURSIVE keyword, and NEXT VALUE FOR is not allowed inside
            // the CTE.
            Self::SqlServer => format!(
                "WITH t(n) AS ( SELECT 1 AS n UNION ALL SELECT n + 1 AS n FROM t WHERE n < ?) \
                 SELECT {next_value} AS n FROM t"
            ),
            // DB2 rejects a SELECT without FROM.
            Self::Db2 => format!(
                "WITH t(n) AS ( SELECT 1 AS n FROM (VALUES 1) UNION ALL SELECT n + 1 AS n FROM t WHERE n < ?) \
                 SELECT {next_value} AS n FROM t"
            ),
            Self::Hsqldb => {
                format!("SELECT {next_value} FROM UNNEST(SEQUENCE_ARRAY(1, ?, 1))")
            }
            Self::Postgres => format!("SELECT {next_value} FROM generate_series(1, ?)"),
            Self::H2 | Self::MariaDb | Self::Firebird | Self::Generic => format!(
                "WITH RECURSIVE t(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM t  WHERE n < ?) \
                 SELECT {next_value} FROM t"
            ),
        }
    }

    /// The expression yielding the next value of `sequence`, which must
    /// already be rendered for this dialect.
    pub fn next_value_expression(self, sequence: &str) -> String {
        match self {
            Self::Postgres => format!("nextval('{sequence}')"),
            Self::Oracle => format!("{sequence}.nextval"),
            Self::MariaDb => format!("nextval({sequence})"),
            Self::SqlServer
            | Self::Db2
            | Self::Hsqldb
            | Self::H2
            | Self::Firebird
            | Self::Generic => format!("next value for {sequence}"),
        }
    }

    /// DDL creating `sequence` starting at 1 with increment 1.
    pub fn create_sequence(self, sequence: &str) -> String {
        match self {
            Self::Postgres => format!("create sequence {sequence} start 1 increment 1"),
            _ => format!("create sequence {sequence} start with 1 increment by 1"),
        }
    }

    /// DDL dropping `sequence`.
    pub fn drop_sequence(self, sequence: &str) -> String {
        match self {
            Self::Postgres | Self::H2 | Self::Hsqldb | Self::MariaDb => {
                format!("drop sequence if exists {sequence}")
            }
            _ => format!("drop sequence {sequence}"),
        }
    }

    /// Quotes one identifier part; embedded closing quotes are doubled.
    pub fn quote(self, text: &str) -> String {
        match self {
            Self::SqlServer => format!("[{}]", text.replace(']', "]]")),
            Self::MariaDb => format!("`{}`", text.replace('`', "``")),
            _ => format!("\"{}\"", text.replace('"', "\"\"")),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    /// Resolves a short key (`postgres`, `mssql`, ...) or a driver product
    /// name (`PostgreSQL`, `Microsoft SQL Server`, `DB2/LINUXX8664`, ...).
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        let dialect = match key.as_str() {
            "oracle" => Self::Oracle,
            "sqlserver" | "mssql" | "microsoft sql server" => Self::SqlServer,
            "postgres" | "postgresql" | "pg" => Self::Postgres,
            "hsqldb" | "hsql" | "hsql database engine" => Self::Hsqldb,
            "h2" => Self::H2,
            "mariadb" => Self::MariaDb,
            "firebird" => Self::Firebird,
            "generic" => Self::Generic,
            // DB2 reports its platform in the product name.
            k if k == "db2" || k.starts_with("db2/") || k.starts_with("db2 ") => Self::Db2,
            _ => {
                return Err(Error::configuration(format!(
                    "unknown database engine: {s}"
                )));
            }
        };
        Ok(dialect)
    }
}
