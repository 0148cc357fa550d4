//! Offline extraction.

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncReadExt;

use mapsearch::models::{Place, SequentialIds};
use mapsearch::services::CoordinateExtractor;

use crate::cli::helpers::print_places;

pub async fn cmd_extract(file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?,
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        }
    };

    let extractor = CoordinateExtractor::new(Arc::new(SequentialIds::new()));
    let places: Vec<Place> = extractor.extract_all(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&places)?);
    } else {
        print_places(&places);
    }
    Ok(())
}
