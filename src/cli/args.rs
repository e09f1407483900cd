//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--backend <sqlite|memory>`: Override the configured graph backend
//!
//! Commit arguments are parsed into [`ObjectId`] by clap, so a malformed
//! identifier is reported as a usage error before any command runs.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::types::ObjectId;
use crate::graph::BackendKind;

/// strata - commit ancestry graph and merge-base engine
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if strata was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Graph backend to use instead of the configured one
    #[arg(long, global = true, value_name = "BACKEND")]
    pub backend: Option<BackendKind>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a strata repository here
    #[command(
        name = "init",
        long_about = "Initialize a strata repository in the current directory.\n\n\
            Creates the .strata/ marker directory, the graph storage directory and a \
            default repository configuration. Running init in an existing repository \
            leaves it untouched.",
        after_help = "\
EXAMPLES:
    strata init
    strata --cwd /data/roads init"
    )]
    Init,

    /// Record a commit and its parents
    #[command(
        name = "put",
        long_about = "Record a commit and its ordered parents in the ancestry graph.\n\n\
            A commit recorded without parents becomes a history root. Parents are only \
            recorded the first time a commit is seen, so repeating a put is harmless. \
            Parent order is kept and used to break ties between equally near merge bases.",
        after_help = "\
EXAMPLES:
    # A root commit
    strata put 3f1c...e2

    # A merge commit with two parents (first parent first)
    strata put 9ab0...11 4d2e...07 77c1...a3"
    )]
    Put {
        /// The commit to record
        commit: ObjectId,

        /// Its parents, first parent first
        parents: Vec<ObjectId>,
    },

    /// Record many commits from rev-list style lines
    #[command(
        name = "import",
        long_about = "Record commits from lines of the form `<commit> [<parent>...]`.\n\n\
            This is the format printed by `git rev-list --parents`. Blank lines and lines \
            starting with # are skipped. Input is read from FILE, or from standard input \
            when FILE is omitted. A malformed line stops the import and names its line \
            number; lines before it stay recorded.",
        after_help = "\
EXAMPLES:
    git rev-list --parents --all | strata import
    strata import history.txt"
    )]
    Import {
        /// File to read (standard input if omitted)
        file: Option<PathBuf>,
    },

    /// Print the parents of a commit
    #[command(name = "parents")]
    Parents {
        /// The commit to inspect
        commit: ObjectId,
    },

    /// Print the commits that name a commit as parent
    #[command(name = "children")]
    Children {
        /// The commit to inspect
        commit: ObjectId,
    },

    /// Print the distance from a commit to the nearest history root
    #[command(
        name = "depth",
        long_about = "Print the fewest parent hops from a commit to a commit without parents.\n\n\
            A root commit, or a commit the graph has never seen, has depth 0."
    )]
    Depth {
        /// The commit to inspect
        commit: ObjectId,
    },

    /// Find a nearest common ancestor of two commits
    #[command(
        name = "merge-base",
        long_about = "Find a nearest common ancestor of two commits.\n\n\
            Both histories are searched breadth-first in lock step, so the result has the \
            smallest combined distance from the two commits. Among equally near \
            candidates the smallest identifier wins. Exits with status 1 when the \
            histories share no commit.",
        after_help = "\
EXAMPLES:
    strata merge-base 9ab0...11 4d2e...07"
    )]
    MergeBase {
        /// First commit
        left: ObjectId,

        /// Second commit
        right: ObjectId,
    },

    /// Check whether one commit is an ancestor of another
    #[command(
        name = "is-ancestor",
        long_about = "Check whether CANDIDATE can be reached from COMMIT through parents.\n\n\
            Prints nothing. Exits with status 0 if it is an ancestor (a commit is its own \
            ancestor) and 1 if it is not.",
        after_help = "\
EXAMPLES:
    strata is-ancestor 4d2e...07 9ab0...11 && echo contained"
    )]
    IsAncestor {
        /// The possible ancestor
        candidate: ObjectId,

        /// The descendant to search from
        commit: ObjectId,
    },

    /// Record that a sparse commit stands for a full-history commit
    #[command(
        name = "map",
        long_about = "Point MAPPED at ORIGINAL.\n\n\
            Sparse (shallow or filtered) histories synthesize local commits; a mapping \
            records which commit of the full history each one corresponds to. Mapping a \
            commit again replaces its previous mapping."
    )]
    Map {
        /// The locally synthesized commit
        mapped: ObjectId,

        /// Its counterpart in the full history
        original: ObjectId,
    },

    /// Print the full-history counterpart of a commit
    #[command(
        name = "mapping",
        long_about = "Print the commit COMMIT is mapped to, or the all-zero identifier when \
            it has no mapping."
    )]
    Mapping {
        /// The commit to inspect
        commit: ObjectId,
    },

    /// Flag a commit whose content was not materialized
    #[command(name = "mark-sparse")]
    MarkSparse {
        /// The commit to flag
        commit: ObjectId,
    },

    /// List a commit and its ancestors, nearest first
    #[command(
        name = "log",
        long_about = "List a commit and its ancestors breadth-first.\n\n\
            Commits at the same distance are listed in identifier order and each commit \
            appears once. Sparse commits are marked.",
        after_help = "\
EXAMPLES:
    strata log 9ab0...11
    strata log 9ab0...11 -n 20
    strata log 9ab0...11 --json"
    )]
    Log {
        /// Where to start
        commit: ObjectId,

        /// Stop after this many commits
        #[arg(short = 'n', long = "max-count", value_name = "N")]
        max_count: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the graph for cycles and print its size
    #[command(
        name = "verify",
        long_about = "Check every commit's ancestry for cycles.\n\n\
            A commit that is its own ancestor means the graph was fed inconsistent input. \
            Exits non-zero when a cycle is found."
    )]
    Verify {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove every commit from the graph
    #[command(
        name = "truncate",
        long_about = "Remove every commit, parent edge and mapping from the graph.\n\n\
            The repository itself stays initialized. Refuses to run without --force."
    )]
    Truncate {
        /// Confirm the truncation
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    #[command(
        name = "config",
        long_about = "Show the effective configuration.\n\n\
            Repository configuration (.strata/config.toml) overrides the global file, and \
            the --backend flag overrides both.",
        after_help = "\
CONFIGURATION FILES:
    $STRATA_CONFIG
    $XDG_CONFIG_HOME/strata/config.toml
    ~/.strata/config.toml
    <repo>/.strata/config.toml"
    )]
    Config {
        /// Print the files that were loaded instead
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.",
        after_help = "\
EXAMPLES:
    # Bash
    strata completion bash > ~/.local/share/bash-completion/completions/strata

    # Zsh
    strata completion zsh > ~/.zfunc/_strata

    # Fish
    strata completion fish > ~/.config/fish/completions/strata.fish

    # PowerShell
    strata completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const A: &str = "1111111111111111111111111111111111111111";
    const B: &str = "2222222222222222222222222222222222222222";

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_put_with_parents() {
        let cli = Cli::try_parse_from(["strata", "put", A, B]).unwrap();
        match cli.command {
            Command::Put { commit, parents } => {
                assert_eq!(commit.to_hex(), A);
                assert_eq!(parents.len(), 1);
                assert_eq!(parents[0].to_hex(), B);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_identifier() {
        assert!(Cli::try_parse_from(["strata", "parents", "xyz"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["strata", "depth", A, "--backend", "memory", "-q"]).unwrap();
        assert_eq!(cli.backend, Some(BackendKind::Memory));
        assert!(cli.quiet);
    }

    #[test]
    fn truncate_force_flag() {
        let cli = Cli::try_parse_from(["strata", "truncate", "--force"]).unwrap();
        assert!(matches!(cli.command, Command::Truncate { force: true }));
    }

    #[test]
    fn log_limit_short_flag() {
        let cli = Cli::try_parse_from(["strata", "log", A, "-n", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Log {
                max_count: Some(5),
                json: false,
                ..
            }
        ));
    }
}
