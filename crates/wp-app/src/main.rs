//! Waypoint scenario runner

mod scenario;

use anyhow::{Context, Result};
use tracing::info;

use scenario::Scenario;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .context("usage: waypoint <scenario.json>")?;
    info!("Running scenario {}", path);

    let scenario = Scenario::from_path(&path)?;
    let reports = scenario::run(&scenario).await?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
