//! Shared helper functions for CLI commands.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use mapsearch::config::Config;
use mapsearch::llm::GeminiClient;
use mapsearch::models::{Coordinate, GroundingSource, Place, ViewportState};
use mapsearch::services::{resolve_location, SearchSession, ViewDecision};

use super::icons::{dim_arrow, pin, warn};

/// Spinner shown while a query is pending.
pub fn spinner(message: impl Into<String>) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Build a session backed by Gemini, failing early without an API key.
pub fn build_session(config: &Config) -> anyhow::Result<SearchSession> {
    let client = GeminiClient::new(config.llm.clone())?;
    if !client.is_available() {
        anyhow::bail!(config.llm.availability_hint());
    }
    Ok(SearchSession::new(Arc::new(client), &config.map))
}

/// Where to bias queries: `--near` first, then the configured home.
pub fn bias_location(near: Option<&str>, config: &Config) -> anyhow::Result<Option<Coordinate>> {
    if let Some(near) = near {
        return Ok(Some(resolve_location(near)?));
    }
    match config.map.home.as_deref() {
        Some(home) => match resolve_location(home) {
            Ok(coordinate) => Ok(Some(coordinate)),
            Err(e) => {
                eprintln!("{} Ignoring configured home: {}", warn(), e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub fn print_places(places: &[Place]) {
    if places.is_empty() {
        println!("{}", style("No places found").dim());
        return;
    }
    for (i, place) in places.iter().enumerate() {
        println!(
            "{} {:>2}. {} {}",
            pin(),
            i + 1,
            style(&place.name).bold(),
            style(format!("({})", place.coordinate)).dim()
        );
        if let Some(ref description) = place.description {
            println!("      {}", description);
        }
    }
}

pub fn print_sources(sources: &[GroundingSource]) {
    if sources.is_empty() {
        return;
    }
    println!("\n{}", style("Sources").bold());
    for source in sources {
        println!("  {} {} {}", dim_arrow(), source.title, style(&source.uri).dim());
    }
}

pub fn format_viewport(view: &ViewportState) -> String {
    format!("{} @ zoom {}", view.center, view.zoom)
}

/// One-line description of a viewport decision.
pub fn describe_decision(decision: &ViewDecision) -> String {
    match decision {
        ViewDecision::FitBounds {
            bounds,
            padding_px,
            viewport,
        } => format!(
            "fit [{} .. {}] +{}px -> {}",
            bounds.south_west(),
            bounds.north_east(),
            padding_px,
            format_viewport(viewport)
        ),
        ViewDecision::FlyTo {
            viewport,
            duration_ms,
        } => format!("fly to {} over {}ms", format_viewport(viewport), duration_ms),
        ViewDecision::NoOp => "no change".to_string(),
    }
}
