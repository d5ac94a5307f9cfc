//! Command dispatch: bridges CLI args -> API calls -> output formatting.

pub mod cache;
pub mod proxy;
pub mod rules;
pub mod setup;
pub mod stats;
pub mod system;
pub mod watch;

use velocache_api::ManagementClient;
use velocache_api::transport::TransportConfig;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::{CliError, api_error};

/// Resolved per-invocation context shared by the one-shot handlers.
pub struct Ctx {
    pub client: ManagementClient,
    pub format: OutputFormat,
}

impl Ctx {
    fn new(global: &GlobalOpts, config: &Config) -> Result<Self, CliError> {
        let server = config::resolve_server(global, config)?;
        let transport = TransportConfig {
            timeout: config::resolve_timeout(global, config),
        };
        let client = ManagementClient::new(server.clone(), &transport)
            .map_err(|e| api_error(e, &server))?;

        Ok(Self {
            client,
            format: config::resolve_output(global, config)?,
        })
    }

    /// Wrap a transport error with the server address in play.
    pub fn error(&self, err: velocache_api::Error) -> CliError {
        api_error(err, self.client.base_url())
    }
}

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts, config: &Config) -> Result<(), CliError> {
    match cmd {
        // Watch drives the full monitor instead of one-shot calls.
        Command::Watch(args) => watch::handle(args, global, config).await,

        cmd => {
            let ctx = Ctx::new(global, config)?;
            match cmd {
                Command::Stats => stats::handle(&ctx).await,
                Command::Cache(args) => cache::handle(&ctx, args).await,
                Command::Rules(args) => rules::handle(&ctx, args).await,
                Command::Proxy(args) => proxy::handle(&ctx, args).await,
                Command::Setup(args) => setup::handle(&ctx, args).await,
                Command::System => system::handle(&ctx).await,
                // Watch and Completions never reach this point
                Command::Watch(_) | Command::Completions(_) => unreachable!(),
            }
        }
    }
}
