//! `velo system` -- server host descriptor.

use velocache_api::models::SystemInfo;

use crate::error::CliError;
use crate::output;

use super::Ctx;

pub async fn handle(ctx: &Ctx) -> Result<(), CliError> {
    let info = ctx.client.system_info().await.map_err(|e| ctx.error(e))?;

    let rendered = output::render_single(ctx.format, &info, detail, |i| i.os.clone());
    output::print_output(&rendered);
    Ok(())
}

fn detail(info: &SystemInfo) -> String {
    format!(
        "OS:       {}\nVersion:  {}",
        info.os,
        info.version.as_deref().unwrap_or("unknown")
    )
}
