//! Headless ability simulation binary.
//!
//! ```bash
//! cargo run -p ability-sim -- --seconds 8 --output json
//! ```

use ability_sim::{Encounter, OutputFormat, SimArgs, SimConfig};
use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SimConfig::from_env().with_args(SimArgs::parse());
    let _guard = ability_sim::logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!(
        content = %config.content_dir.display(),
        tick_rate = config.tick_rate,
        seconds = config.seconds,
        "starting simulation"
    );

    let encounter = Encounter::from_config(&config).with_context(|| {
        format!(
            "Failed to set up encounter from {}",
            config.content_dir.display()
        )
    })?;
    let report = encounter.run(&config);

    match config.output {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
