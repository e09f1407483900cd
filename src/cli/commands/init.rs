//! init command - Initialize a strata repository

use crate::cli::{Context, Outcome};
use crate::core::config::{Config, ConfigFile, GraphSection};
use crate::core::paths::RepoPaths;
use crate::graph::{BackendKind, GraphStore};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Initialize a strata repository in the working directory.
///
/// Creates `.strata/`, a repository config naming the backend, and the
/// graph storage with its root anchor. An existing repository is left alone.
pub fn init(ctx: &Context) -> Result<Outcome> {
    let verbosity = ctx.verbosity();
    let paths = RepoPaths::new(ctx.cwd()?);

    if paths.is_repository() {
        output::print(
            format!(
                "strata is already initialized in {}",
                paths.root.display()
            ),
            verbosity,
        );
        return Ok(Outcome::Done);
    }

    let marker = paths.marker_dir();
    std::fs::create_dir_all(&marker)
        .with_context(|| format!("Failed to create {}", marker.display()))?;

    let backend = ctx.backend.unwrap_or_default();
    if backend == BackendKind::Memory {
        output::warn(
            "the memory backend keeps nothing once a command exits",
            verbosity,
        );
    }
    let file = ConfigFile {
        graph: Some(GraphSection {
            backend: Some(backend.to_string()),
        }),
        ..Default::default()
    };
    let config_path = Config::write_repo(&paths, &file).context("Failed to write config")?;
    output::debug(
        format!("wrote {}", config_path.display()),
        verbosity,
    );

    let config = Config::load(Some(&paths)).context("Failed to load configuration")?;
    let mut store = GraphStore::new(paths.clone(), ctx.graph_options(&config));
    store.open().context("Failed to create the commit graph")?;
    output::debug(&store, verbosity);
    store.close()?;

    output::success(
        format!(
            "Initialized strata repository in {}",
            paths.root.display()
        ),
        verbosity,
    );
    Ok(Outcome::Done)
}
