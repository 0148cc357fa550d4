//! Saved places management.

use console::style;

use mapsearch::config::Config;
use mapsearch::models::PlaceId;
use mapsearch::services::{ReconcileSettings, ViewReconciler};
use mapsearch::storage::SavedPlacesStore;

use crate::cli::helpers::describe_decision;
use crate::cli::icons::{dim_arrow, pin, success, warn};

pub async fn cmd_saved_list(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = SavedPlacesStore::open(config.saved_places_path());
    let records = store.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", style("No saved places").dim());
        return Ok(());
    }

    for record in &records {
        println!(
            "{} {} {}",
            pin(),
            style(&record.name).bold(),
            style(format!("({})", record.coordinate)).dim()
        );
        println!(
            "    {} {}  saved {}",
            dim_arrow(),
            record.id,
            record.saved_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("\n{} place(s) in {}", records.len(), store.path().display());
    Ok(())
}

pub async fn cmd_saved_remove(config: &Config, id: &str, name: &str) -> anyhow::Result<()> {
    let store = SavedPlacesStore::open(config.saved_places_path());
    if store.remove(&PlaceId::new(id), name).await? {
        println!("{} Removed {}", success(), name);
    } else {
        println!("{} No saved place matches {} / {}", warn(), id, name);
    }
    Ok(())
}

pub async fn cmd_saved_show(config: &Config) -> anyhow::Result<()> {
    let store = SavedPlacesStore::open(config.saved_places_path());
    let places = store.places().await?;

    let reconciler = ViewReconciler::new(ReconcileSettings::from(&config.map));
    match reconciler.fit(&places) {
        Some(decision) => println!(
            "{} {} saved place(s): {}",
            pin(),
            places.len(),
            describe_decision(&decision)
        ),
        None => println!("{}", style("No saved places").dim()),
    }
    Ok(())
}
