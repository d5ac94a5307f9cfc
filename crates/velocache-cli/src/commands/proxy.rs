//! `velo proxy` -- engine start/stop/status.

use crate::cli::{ProxyArgs, ProxyCommand};
use crate::error::CliError;
use crate::output;

use super::Ctx;

pub async fn handle(ctx: &Ctx, args: ProxyArgs) -> Result<(), CliError> {
    match args.command {
        ProxyCommand::Status => status(ctx).await,
        ProxyCommand::Start => {
            ctx.client.start_proxy().await.map_err(|e| ctx.error(e))?;
            output::print_output("Proxy started");
            Ok(())
        }
        ProxyCommand::Stop => {
            ctx.client.stop_proxy().await.map_err(|e| ctx.error(e))?;
            output::print_output("Proxy stopped");
            Ok(())
        }
    }
}

async fn status(ctx: &Ctx) -> Result<(), CliError> {
    let state = ctx.client.proxy_state().await.map_err(|e| ctx.error(e))?;

    let word = if state.running { "running" } else { "stopped" };
    let rendered = output::render_single(
        ctx.format,
        &state,
        |_| format!("Proxy is {word}"),
        |_| word.to_owned(),
    );
    output::print_output(&rendered);
    Ok(())
}
