use crate::{
    config::{CliArgs, RunConfig},
    telemetry::init_telemetry,
};
use batchseq::{BatchSequenceGenerator, GeneratedId, MemoryDatabase};
use clap::Parser;
use std::{
    collections::HashSet,
    sync::{Arc, Barrier, Mutex},
    thread::scope,
    time::Instant,
};

mod config;
mod telemetry;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;
    init_telemetry()?;

    tracing::info!(
        dialect = %config.dialect,
        sequence = %config.batch.sequence(),
        fetch_size = config.batch.fetch_size().get(),
        kind = %config.kind,
        "Configured generator"
    );

    let generator = BatchSequenceGenerator::new(config.batch.clone(), config.kind);
    generator.initialize(config.dialect)?;
    print_sql(&generator, &config)?;

    if config.sql_only {
        return Ok(());
    }

    run(&generator, &config)
}

fn print_sql(generator: &BatchSequenceGenerator, config: &RunConfig) -> anyhow::Result<()> {
    let dialect = config.dialect;
    println!("dialect:       {dialect}");
    println!("batch select:  {}", generator.select().unwrap_or_default());
    println!("bulk fragment: {}", generator.bulk_insertion_fragment(dialect)?);
    println!("create ddl:    {}", generator.create_sequence_ddl(dialect)?);
    println!("drop ddl:      {}", generator.drop_sequence_ddl(dialect)?);
    Ok(())
}

fn run(generator: &BatchSequenceGenerator, config: &RunConfig) -> anyhow::Result<()> {
    let db = MemoryDatabase::new(config.dialect);
    db.create_sequence(config.batch.sequence().render(config.dialect));

    let seen = Mutex::new(HashSet::<GeneratedId>::with_capacity(config.total_ids()));
    let barrier = Arc::new(Barrier::new(config.threads));
    let start = Instant::now();

    scope(|s| -> anyhow::Result<()> {
        let handles: Vec<_> = (0..config.threads)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let (db, seen) = (&db, &seen);
                s.spawn(move || -> batchseq::Result<Vec<GeneratedId>> {
                    barrier.wait();
                    let ids = (0..config.ids_per_thread)
                        .map(|_| generator.generate(db))
                        .collect::<batchseq::Result<Vec<_>>>()?;
                    seen.lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .extend(ids.iter().copied());
                    Ok(ids)
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(ids) => {
                    ids?;
                }
                Err(_) => anyhow::bail!("generator thread panicked"),
            }
        }
        Ok(())
    })?;

    let elapsed = start.elapsed();
    let distinct = seen
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .len();
    let round_trips = db.round_trips();

    tracing::info!(
        threads = config.threads,
        ids = config.total_ids(),
        distinct,
        round_trips,
        ?elapsed,
        "Generation finished"
    );

    println!("generated:     {}", config.total_ids());
    println!("distinct:      {distinct}");
    println!("round trips:   {round_trips}");

    if distinct != config.total_ids() {
        anyhow::bail!(
            "expected {} distinct identifiers, got {distinct}",
            config.total_ids()
        );
    }
    Ok(())
}
