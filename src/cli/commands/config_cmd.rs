//! Configuration display.

use console::style;

use mapsearch::config::Config;

/// Print the effective configuration as TOML.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => eprintln!("{} {}", style("# Loaded from").dim(), path.display()),
        None => eprintln!("{}", style("# No config file found, using defaults").dim()),
    }
    eprintln!(
        "{} {}",
        style("# Saved places:").dim(),
        config.saved_places_path().display()
    );
    eprintln!(
        "{} {}",
        style("# API key:").dim(),
        if config.llm.api_key().is_some() {
            "set"
        } else {
            "not set"
        }
    );
    print!("{}", config.to_toml()?);
    Ok(())
}
