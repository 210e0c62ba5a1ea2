use std::error::Error;

use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod figure;
mod loader;
mod paper;
mod stats;

use config::PlotConfig;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PlotConfig::paper();
    println!(
        "Generating paper figure from {}...",
        config.working_dir.display()
    );

    let figure = paper::build_figure(&config)?;
    figure.save(&config.output_path)?;

    println!("Saved to {}", config.output_path.display());

    Ok(())
}
