use std::path::PathBuf;

use anyhow::Context;
use calseries_app::report::{QueryWindow, calendar_report};
use calseries_core::config::load_config;
use calseries_rfc::rfc::ical::expand::{ComponentAssembler, ExpansionOptions, TimezoneRegistry};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting calseries");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let input: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.query.input.clone())
        .context("no input calendar given; pass a path or set query.input")?;

    let registry = TimezoneRegistry::global();

    if let Some(database) = &config.timezones.database {
        let json = tokio::fs::read_to_string(database)
            .await
            .with_context(|| format!("reading timezone database {}", database.display()))?;
        let loaded = registry.load_database(&json)?;
        tracing::info!(path = %database.display(), zones = loaded, "Timezone database loaded");
    }

    let text = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("reading calendar {}", input.display()))?;

    let assembler = ComponentAssembler::new(registry).with_options(ExpansionOptions {
        fork_exceptions: config.expansion.fork_exceptions,
    });
    let calendar = assembler.assemble(&text)?;

    tracing::info!(path = %input.display(), series = calendar.len(), "Calendar assembled");

    let window = QueryWindow::from_config(&config.query, chrono::Local::now().date_naive())?;
    for line in calendar_report(&calendar, &window, config.expansion.max_occurrences) {
        println!("{line}");
    }

    Ok(())
}
