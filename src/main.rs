use anyhow::Context;
use weather_collector::{api_key_from_env, Pipeline, RunConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RunConfig::from_env().context("Failed to load configuration")?;
    let api_key = api_key_from_env()?;
    let pipeline = Pipeline::from_config(&config, api_key)?;

    let report = pipeline.run().await?;

    println!("{}", report.summary);
    println!();
    println!(
        "Collected {} record(s) from {}/{} location(s) at {}",
        report.table.len(),
        report.succeeded().count(),
        report.outcomes.len(),
        report.snapshot_timestamp
    );
    for outcome in report.failed() {
        if let Err(e) = &outcome.result {
            println!("  skipped {}: {}", outcome.location, e);
        }
    }

    let persistence = &report.persistence;
    match &persistence.master_append {
        Ok(rows) => println!("Master log: {} new row(s)", rows),
        Err(e) => println!("Master log: FAILED ({})", e),
    }
    match &persistence.master_export {
        Ok(rows) => println!(
            "Master file: {} ({} row(s))",
            pipeline.store().master_file().display(),
            rows
        ),
        Err(e) => println!("Master file: FAILED ({})", e),
    }
    match &persistence.snapshot {
        Ok(path) => println!("Snapshot: {}", path.display()),
        Err(e) => println!("Snapshot: FAILED ({})", e),
    }

    if !persistence.is_complete() {
        anyhow::bail!("One or more outputs could not be written");
    }
    Ok(())
}
