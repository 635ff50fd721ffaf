use anyhow::{anyhow, Result};
use clap::Parser;
use seismic_model::config::Config;
use seismic_model::presets::{demo_model, DemoModel};
use seismic_model::visualisation::FieldVisualiser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Build a seismic model from a TOML configuration
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration
    config: PathBuf,

    /// Field to render, overriding `output.plot`
    #[arg(long)]
    plot: Option<String>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    let model = demo_model(
        &config.model.preset,
        config.model.grid_params(),
        Some(config.model.space_order),
    )?;

    info!(
        preset = %config.model.preset,
        shape = ?config.model.shape,
        padded = ?model.shape_domain(),
        domain_size = ?model.domain_size(),
        "model built"
    );
    for field in model.fields() {
        info!(
            field = field.name(),
            uniform = field.is_uniform(),
            min = field.min(),
            max = field.max(),
            "field"
        );
    }
    if let DemoModel::Seismic(m) = &model {
        for diagnostic in m.diagnostics() {
            warn!("{}", diagnostic);
        }
    }
    info!(critical_dt = model.critical_dt(), "stability bound");

    if let Some(name) = cli.plot.or(config.output.plot) {
        let visualiser = FieldVisualiser::new(
            &config.output.directory,
            config.output.image_width,
            config.output.image_height,
        )?;
        let data = if name == "damp" {
            model.damp().data()
        } else {
            let field = model
                .field(&name)
                .ok_or_else(|| anyhow!("Model has no field named '{}'", name))?;
            match field.as_function() {
                Some(f) => f.data(),
                None => return Err(anyhow!("Field '{}' is uniform, nothing to plot", name)),
            }
        };
        visualiser.plot_field(data, &name)?;
    }

    Ok(())
}
