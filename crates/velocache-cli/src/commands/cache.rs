//! `velo cache` -- stored entry listing and removal.

use tabled::Tabled;

use velocache_api::models::CacheEntry;

use crate::cli::{CacheArgs, CacheCommand};
use crate::error::CliError;
use crate::output::{self, fmt_bytes};

use super::Ctx;

pub async fn handle(ctx: &Ctx, args: CacheArgs) -> Result<(), CliError> {
    match args.command {
        CacheCommand::List => list(ctx).await,
        CacheCommand::Delete { hash } => delete(ctx, &hash).await,
        CacheCommand::Clear { yes } => clear(ctx, yes).await,
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "HASH")]
    hash: String,
    #[tabled(rename = "SIZE")]
    size: String,
    #[tabled(rename = "TYPE")]
    content_type: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "URL")]
    url: String,
}

async fn list(ctx: &Ctx) -> Result<(), CliError> {
    let entries = ctx.client.list_entries().await.map_err(|e| ctx.error(e))?;

    let rendered = output::render_list(ctx.format, &entries, to_row, |e| e.hash.clone());
    output::print_output(&rendered);
    Ok(())
}

fn to_row(entry: &CacheEntry) -> EntryRow {
    EntryRow {
        hash: entry.hash.clone(),
        size: fmt_bytes(entry.size),
        content_type: entry.content_type().unwrap_or("-").to_owned(),
        created: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        url: entry.url.clone(),
    }
}

async fn delete(ctx: &Ctx, hash: &str) -> Result<(), CliError> {
    ctx.client.delete_entry(hash).await.map_err(|e| {
        if e.is_not_found() {
            CliError::NotFound {
                resource: "cache entry".into(),
                identifier: hash.to_owned(),
                list_command: "cache list".into(),
            }
        } else {
            ctx.error(e)
        }
    })?;

    output::print_output(&format!("Deleted entry {hash}"));
    Ok(())
}

async fn clear(ctx: &Ctx, yes: bool) -> Result<(), CliError> {
    if !yes {
        return Err(CliError::ConfirmationRequired {
            action: "cache clear".into(),
        });
    }

    ctx.client.clear_cache().await.map_err(|e| ctx.error(e))?;
    output::print_output("Cache cleared");
    Ok(())
}
