//! One-shot search.

use console::style;
use serde::Serialize;

use mapsearch::config::Config;
use mapsearch::models::{SearchResult, ViewportState};
use mapsearch::services::{SearchError, ViewDecision};
use mapsearch::storage::SavedPlacesStore;

use crate::cli::helpers::{
    bias_location, build_session, describe_decision, print_places, print_sources, spinner,
};
use crate::cli::icons::{success, warn};

#[derive(Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    result: &'a SearchResult,
    decision: &'a ViewDecision,
    viewport: &'a ViewportState,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<usize>,
}

pub async fn cmd_search(
    config: &Config,
    query: &str,
    near: Option<&str>,
    save: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = build_session(config)?;
    let bias = bias_location(near, config)?;
    session.set_user_location(bias);

    let pb = spinner(format!("Searching for {}...", query))?;
    let outcome = session.submit_query(query, bias).await;
    pb.finish_and_clear();

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => return Err(failure(e)),
    };

    let saved = if save {
        let store = SavedPlacesStore::open(config.saved_places_path());
        match session.save_results(&store).await {
            Ok(added) => Some(added),
            Err(e) => {
                eprintln!("{} Could not save places: {}", warn(), e);
                None
            }
        }
    } else {
        None
    };

    if json {
        let report = SearchReport {
            query,
            result: &outcome.result,
            decision: &outcome.decision,
            viewport: &outcome.viewport,
            saved,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}\n", outcome.result.summary.trim());
    print_places(&outcome.result.places);
    print_sources(&outcome.result.sources);
    println!(
        "\n{} {}",
        style("Map:").bold(),
        describe_decision(&outcome.decision)
    );
    if let Some(added) = saved {
        println!("{} Saved {} new place(s)", success(), added);
    }

    Ok(())
}

/// The error a failed search exits with.
///
/// Transport failures carry only the user-facing apology; the transport
/// detail goes to the debug log.
fn failure(e: SearchError) -> anyhow::Error {
    match e.user_message() {
        Some(message) => {
            tracing::debug!("{}", e);
            anyhow::anyhow!(message)
        }
        None => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsearch::llm::TransportError;
    use mapsearch::services::SEARCH_FAILED_MESSAGE;

    #[test]
    fn test_transport_failure_reported_once() {
        let err = failure(SearchError::Transport(TransportError::Auth(
            "API key not valid".to_string(),
        )));
        assert_eq!(format!("{:#}", err), SEARCH_FAILED_MESSAGE);
        assert_eq!(err.chain().count(), 1);
    }

    #[test]
    fn test_superseded_keeps_detail() {
        let err = failure(SearchError::Superseded {
            generation: 1,
            latest: 2,
        });
        assert!(err.to_string().contains("superseded"));
    }
}
