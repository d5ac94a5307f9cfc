//! `velo setup` -- one-shot host integration helpers.

use crate::cli::{SetupArgs, SetupCommand};
use crate::error::CliError;
use crate::output;

use super::Ctx;

pub async fn handle(ctx: &Ctx, args: SetupArgs) -> Result<(), CliError> {
    match args.command {
        SetupCommand::Cert { out } => {
            let pem = ctx
                .client
                .fetch_ca_certificate()
                .await
                .map_err(|e| ctx.error(e))?;
            std::fs::write(&out, pem)?;

            output::print_output(&format!(
                "CA certificate written to {}\n\
                 Install it into your system or browser trust store to \
                 intercept HTTPS traffic.",
                out.display()
            ));
            Ok(())
        }
        SetupCommand::EnableProxy => {
            ctx.client
                .enable_system_proxy()
                .await
                .map_err(|e| ctx.error(e))?;
            output::print_output("System proxy settings now point at VeloCache");
            Ok(())
        }
        SetupCommand::DisableProxy => {
            ctx.client
                .disable_system_proxy()
                .await
                .map_err(|e| ctx.error(e))?;
            output::print_output("System proxy settings restored");
            Ok(())
        }
    }
}
