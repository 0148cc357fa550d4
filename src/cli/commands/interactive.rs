//! Line-oriented search session.
//!
//! Plain lines are queries. A new query may be typed while the previous one
//! is still pending; the older response is then discarded when it arrives.

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use mapsearch::config::Config;
use mapsearch::llm::{TransportError, TransportResponse};
use mapsearch::services::{FixedLocation, QueryTicket, SearchError, SearchSession};
use mapsearch::storage::SavedPlacesStore;

use crate::cli::helpers::{
    bias_location, build_session, describe_decision, format_viewport, print_places,
    print_sources,
};
use crate::cli::icons::{dim_arrow, error, success, warn};

const HELP: &str = "\
  <text>                 search
  :clear                 clear results, return to the pre-search view
  :saved                 browse saved places
  :back                  leave saved places
  :save                  save the current places
  :go <N>                fly to place N
  :pan <LAT> <LNG> <Z>   report a finished pan/zoom
  :view                  show the current viewport
  :quit                  exit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Query(String),
    Clear,
    Saved,
    Back,
    Save,
    Go(usize),
    Pan { lat: f64, lng: f64, zoom: i32 },
    View,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Some(Command::Query(line.to_string())));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let command = match (name, args.as_slice()) {
            ("clear", []) => Command::Clear,
            ("saved", []) => Command::Saved,
            ("back", []) => Command::Back,
            ("save", []) => Command::Save,
            ("go", [n]) => Command::Go(n.parse().map_err(|_| format!("not a number: {}", n))?),
            ("pan", [lat, lng, zoom]) => Command::Pan {
                lat: lat.parse().map_err(|_| format!("bad latitude: {}", lat))?,
                lng: lng.parse().map_err(|_| format!("bad longitude: {}", lng))?,
                zoom: zoom.parse().map_err(|_| format!("bad zoom: {}", zoom))?,
            },
            ("view", []) => Command::View,
            ("help", []) | ("h", []) => Command::Help,
            ("quit", []) | ("q", []) => Command::Quit,
            _ => return Err(format!("unknown command: {} (try :help)", line)),
        };
        Ok(Some(command))
    }
}

type Pending = JoinSet<(QueryTicket, Result<TransportResponse, TransportError>)>;

pub async fn cmd_interactive(config: &Config, near: Option<&str>) -> anyhow::Result<()> {
    let mut session = build_session(config)?;
    let store = SavedPlacesStore::open(config.saved_places_path());

    if let Some(position) = bias_location(near, config)? {
        let decision = session.locate_user(&FixedLocation::at(position)).await?;
        println!("{} {}", dim_arrow(), describe_decision(&decision));
    }
    println!(
        "{} {} (:help for commands)",
        style("Map at").dim(),
        format_viewport(&session.viewport())
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Pending = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match Command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        eprintln!("{} {}", warn(), message);
                        continue;
                    }
                };
                if command == Command::Quit {
                    return Ok(());
                }
                run_command(&mut session, &store, &mut pending, command).await;
            }
            Some(joined) = pending.join_next(), if !pending.is_empty() => {
                match joined {
                    Ok((ticket, response)) => finish_query(&mut session, ticket, response),
                    Err(e) => eprintln!("{} Query task failed: {}", error(), e),
                }
            }
        }
    }

    // Input closed; let the latest query land before exiting.
    while let Some(joined) = pending.join_next().await {
        if let Ok((ticket, response)) = joined {
            finish_query(&mut session, ticket, response);
        }
    }
    Ok(())
}

async fn run_command(
    session: &mut SearchSession,
    store: &SavedPlacesStore,
    pending: &mut Pending,
    command: Command,
) {
    match command {
        Command::Query(text) => {
            let bias = session.user_location();
            let ticket = session.begin_query(&text, bias);
            let transport = session.transport();
            println!("{} Searching...", dim_arrow());
            pending.spawn(async move {
                let response = transport.query(&ticket.text, ticket.bias).await;
                (ticket, response)
            });
        }
        Command::Clear => {
            let view = session.clear_results();
            println!("{} Cleared, back at {}", success(), format_viewport(&view));
        }
        Command::Saved => match store.places().await {
            Ok(places) => {
                let decision = session.browse_saved(places);
                print_places(&session.result().places);
                println!("{} {}", dim_arrow(), describe_decision(&decision));
            }
            Err(e) => eprintln!("{} Could not read saved places: {}", warn(), e),
        },
        Command::Back => match session.exit_saved() {
            Some(view) => println!("{} Back at {}", success(), format_viewport(&view)),
            None => println!("{}", style("Not browsing saved places").dim()),
        },
        Command::Save => match session.save_results(store).await {
            Ok(added) => println!("{} Saved {} new place(s)", success(), added),
            Err(e) => eprintln!("{} Could not save places: {}", warn(), e),
        },
        Command::Go(n) => {
            let id = n
                .checked_sub(1)
                .and_then(|i| session.result().places.get(i))
                .map(|p| p.id.clone());
            match id.and_then(|id| session.navigate_to(&id)) {
                Some(decision) => println!("{} {}", dim_arrow(), describe_decision(&decision)),
                None => eprintln!("{} No place {}", warn(), n),
            }
        }
        Command::Pan { lat, lng, zoom } => {
            let decision = session.on_gesture_end(lat, lng, zoom);
            println!(
                "{} {} ({})",
                dim_arrow(),
                format_viewport(&session.viewport()),
                describe_decision(&decision)
            );
        }
        Command::View => {
            println!("{}", format_viewport(&session.viewport()));
            if session.is_busy() {
                println!("{}", style("(search pending)").dim());
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

fn finish_query(
    session: &mut SearchSession,
    ticket: QueryTicket,
    response: Result<TransportResponse, TransportError>,
) {
    match session.complete_query(ticket, response) {
        Ok(outcome) => {
            println!("\n{}\n", outcome.result.summary.trim());
            print_places(&outcome.result.places);
            print_sources(&outcome.result.sources);
            println!("{} {}", dim_arrow(), describe_decision(&outcome.decision));
        }
        Err(SearchError::Superseded { .. }) => {}
        Err(e) => {
            tracing::debug!("{}", e);
            eprintln!("{} {}", error(), e.user_message().unwrap_or_default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_and_commands() {
        assert_eq!(Command::parse("  "), Ok(None));
        assert_eq!(
            Command::parse("pizza in Naples"),
            Ok(Some(Command::Query("pizza in Naples".to_string())))
        );
        assert_eq!(Command::parse(":go 2"), Ok(Some(Command::Go(2))));
        assert_eq!(
            Command::parse(":pan 40.7 -74.0 13"),
            Ok(Some(Command::Pan {
                lat: 40.7,
                lng: -74.0,
                zoom: 13
            }))
        );
        assert_eq!(Command::parse(":q"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(":go two").is_err());
        assert!(Command::parse(":pan 1 2").is_err());
        assert!(Command::parse(":fly").is_err());
    }
}
