use anyhow::{Context, bail};
use batchseq::{BatchConfiguration, BatchSequence, DEFAULT_FETCH_SIZE, Dialect, NumericKind};
use clap::Parser;

/// Runtime configuration for the `batchseq` binary.
///
/// Every value can come from a CLI flag, an environment variable or a `.env`
/// file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "batchseq",
    version,
    about = "Show the batched sequence SQL for a dialect and exercise a shared generator"
)]
pub struct CliArgs {
    /// Database engine, as a short key (`postgres`, `oracle`, `sqlserver`,
    /// `db2`, `hsqldb`, `h2`, `mariadb`, `firebird`, `generic`) or a driver
    /// product name.
    ///
    /// Environment variable: `BATCHSEQ_DIALECT`
    #[arg(long, env = "BATCHSEQ_DIALECT", default_value_t = String::from("postgres"))]
    pub dialect: String,

    /// Sequence name; may be qualified as `schema.name` or
    /// `catalog.schema.name`.
    ///
    /// Environment variable: `BATCHSEQ_SEQUENCE`
    #[arg(long, env = "BATCHSEQ_SEQUENCE")]
    pub sequence: String,

    /// Catalog of the sequence. Ignored for qualified sequence names.
    ///
    /// Environment variable: `BATCHSEQ_CATALOG`
    #[arg(long, env = "BATCHSEQ_CATALOG")]
    pub catalog: Option<String>,

    /// Schema of the sequence. Ignored for qualified sequence names.
    ///
    /// Environment variable: `BATCHSEQ_SCHEMA`
    #[arg(long, env = "BATCHSEQ_SCHEMA")]
    pub schema: Option<String>,

    /// Number of sequence values fetched per round trip.
    ///
    /// Environment variable: `BATCHSEQ_FETCH_SIZE`
    #[arg(long, env = "BATCHSEQ_FETCH_SIZE", default_value_t = i64::from(DEFAULT_FETCH_SIZE), allow_negative_numbers = true)]
    pub fetch_size: i64,

    /// Identifier type: `integer`, `long`, `biginteger` or `bigdecimal`.
    ///
    /// Environment variable: `BATCHSEQ_ID_TYPE`
    #[arg(long, env = "BATCHSEQ_ID_TYPE", default_value_t = String::from("long"))]
    pub id_type: String,

    /// Number of threads drawing identifiers from the shared generator.
    ///
    /// Environment variable: `BATCHSEQ_THREADS`
    #[arg(long, env = "BATCHSEQ_THREADS", default_value_t = 4)]
    pub threads: usize,

    /// Identifiers requested by each thread.
    ///
    /// Environment variable: `BATCHSEQ_IDS`
    #[arg(long, env = "BATCHSEQ_IDS", default_value_t = 100)]
    pub ids: usize,

    /// Only print the SQL, do not run the in-memory exercise.
    #[arg(long, default_value_t = false)]
    pub sql_only: bool,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dialect: Dialect,
    pub batch: BatchConfiguration,
    pub kind: NumericKind,
    pub threads: usize,
    pub ids_per_thread: usize,
    pub sql_only: bool,
}

impl RunConfig {
    pub fn total_ids(&self) -> usize {
        self.threads * self.ids_per_thread
    }
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let dialect: Dialect = args.dialect.parse().context("BATCHSEQ_DIALECT")?;
        let kind: NumericKind = args.id_type.parse().context("BATCHSEQ_ID_TYPE")?;

        let mut annotation = BatchSequence::new(args.sequence).with_fetch_size(args.fetch_size);
        annotation.catalog = args.catalog;
        annotation.schema = args.schema;
        let batch = BatchConfiguration::from_annotation(&annotation)?;

        if !args.sql_only {
            if args.threads == 0 {
                bail!("BATCHSEQ_THREADS must be greater than 0");
            }
            if args.threads.checked_mul(args.ids).is_none() {
                bail!(
                    "BATCHSEQ_THREADS ({}) x BATCHSEQ_IDS ({}) overflows",
                    args.threads,
                    args.ids
                );
            }
        }

        Ok(Self {
            dialect,
            batch,
            kind,
            threads: args.threads,
            ids_per_thread: args.ids,
            sql_only: args.sql_only,
        })
    }
}
