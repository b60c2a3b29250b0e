//! Command-line arguments of the `scenario-mock-server` binary.
//!
//! Flags given to `serve` take precedence over the `options` block of the
//! scenario file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ServerOptions;

/// Scenario-driven mock API server.
#[derive(Parser, Debug)]
#[command(name = "scenario-mock-server", about = "Scenario-driven mock API server", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the scenarios of a scenario file.
    Serve {
        /// Path to the JSON scenario file.
        #[arg(long, short, env = "SCENARIO_MOCK_CONFIG")]
        config: PathBuf,

        /// Port to listen on, overriding the file's options.
        #[arg(long, short, env = "SCENARIO_MOCK_PORT")]
        port: Option<u16>,

        /// Keep the active scenario and context in a cookie.
        #[arg(long, env = "SCENARIO_MOCK_COOKIE_MODE")]
        cookie_mode: bool,

        /// Number of header-correlated contexts kept in memory.
        #[arg(long, env = "SCENARIO_MOCK_PARALLEL_CONTEXT_SIZE")]
        parallel_context_size: Option<usize>,
    },

    /// List the scenarios of a scenario file.
    List {
        /// Path to the JSON scenario file.
        #[arg(long, short, env = "SCENARIO_MOCK_CONFIG")]
        config: PathBuf,

        /// Output as JSON instead of a table.
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print the JSON Schema of the scenario file format.
    Schema,
}

impl Command {
    /// Apply `serve` flags on top of the options read from the file.
    pub fn apply_overrides(&self, mut options: ServerOptions) -> ServerOptions {
        if let Self::Serve {
            port,
            cookie_mode,
            parallel_context_size,
            ..
        } = self
        {
            if let Some(port) = port {
                options.port = *port;
            }
            if *cookie_mode {
                options.cookie_mode = true;
            }
            if let Some(size) = parallel_context_size {
                options.parallel_context_size = *size;
            }
        }
        options
    }
}
