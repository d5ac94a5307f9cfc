//! Argument definitions for the `velo` binary.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "velo",
    version,
    about = "Operator console for a VeloCache caching proxy",
    long_about = "Inspect and control a running VeloCache instance: cache \
                  counters, stored entries, traffic rules, proxy state, and \
                  a live event tail."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Management server base URL (e.g. http://127.0.0.1:8080)
    #[arg(short, long, global = true, env = "VELOCACHE_SERVER")]
    pub server: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, env = "VELOCACHE_OUTPUT")]
    pub output: Option<OutputFormat>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "VELOCACHE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Pretty-printed JSON
    Json,
    /// One identifier per line, for scripting
    Plain,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show cache counters and hit rate
    Stats,

    /// Inspect and manage stored cache entries
    Cache(CacheArgs),

    /// Show the configured traffic rules
    Rules(RulesArgs),

    /// Control the proxy engine
    Proxy(ProxyArgs),

    /// One-shot host setup helpers (CA certificate, OS proxy settings)
    Setup(SetupArgs),

    /// Show server host information
    System,

    /// Tail live events: flows, log lines, connection state
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List stored entries
    List,

    /// Delete one entry by hash
    Delete {
        /// Entry hash (see `velo cache list`)
        hash: String,
    },

    /// Delete every stored entry
    Clear {
        /// Skip the confirmation requirement
        #[arg(short, long)]
        yes: bool,
    },
}

// ── rules ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// List the configured rules
    List,
}

// ── proxy ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProxyArgs {
    #[command(subcommand)]
    pub command: ProxyCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProxyCommand {
    /// Show whether the proxy engine is running
    Status,
    /// Start the proxy engine
    Start,
    /// Stop the proxy engine
    Stop,
}

// ── setup ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetupArgs {
    #[command(subcommand)]
    pub command: SetupCommand,
}

#[derive(Debug, Subcommand)]
pub enum SetupCommand {
    /// Download the CA certificate to a file
    Cert {
        /// Output path
        #[arg(long, default_value = "velocache-ca.crt")]
        out: PathBuf,
    },
    /// Point the OS proxy settings at VeloCache
    EnableProxy,
    /// Restore the OS proxy settings
    DisableProxy,
}

// ── watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Also print counter snapshots as they update
    #[arg(long)]
    pub stats: bool,

    /// Suppress server log lines
    #[arg(long)]
    pub no_logs: bool,
}

// ── completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
