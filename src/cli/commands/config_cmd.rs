//! config command - Show the effective configuration

use crate::cli::{Context, Outcome};
use crate::core::config::Config;
use crate::core::paths::RepoPaths;
use anyhow::{Context as _, Result};

/// Print the effective configuration, or with `path` the files it came from.
///
/// Works outside a repository, where only the global file applies.
pub fn config(ctx: &Context, path: bool) -> Result<Outcome> {
    let repo = RepoPaths::discover(&ctx.cwd()?);
    let config = Config::load(repo.as_ref()).context("Failed to load configuration")?;

    if path {
        let show = |p: Option<&std::path::Path>| {
            p.map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        };
        println!("global = {}", show(config.global_config_loaded_from()));
        println!("repo = {}", show(config.repo_config_loaded_from()));
        return Ok(Outcome::Done);
    }

    let options = ctx.graph_options(&config);
    println!("[graph]");
    println!("backend = \"{}\"", options.backend);
    println!();
    println!("[sqlite]");
    println!("synchronous = \"{}\"", options.synchronous.as_str());
    println!("busy_timeout_ms = {}", options.busy_timeout.as_millis());
    Ok(Outcome::Done)
}
