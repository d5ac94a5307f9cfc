//! `velo stats` -- cache counter snapshot.

use velocache_api::models::CacheStats;

use crate::error::CliError;
use crate::output::{self, fmt_bytes};

use super::Ctx;

pub async fn handle(ctx: &Ctx) -> Result<(), CliError> {
    let stats = ctx.client.fetch_stats().await.map_err(|e| ctx.error(e))?;

    let rendered = output::render_single(ctx.format, &stats, detail, |s| {
        format!("{} {} {}", s.hits, s.misses, s.total_requests)
    });
    output::print_output(&rendered);
    Ok(())
}

fn detail(stats: &CacheStats) -> String {
    let hit_rate = stats
        .hit_rate()
        .map_or_else(|| "n/a".to_owned(), |r| format!("{r:.1}%"));

    format!(
        "Requests:      {}\n\
         Hits:          {}\n\
         Misses:        {}\n\
         Hit rate:      {}\n\
         Disk items:    {}\n\
         Disk size:     {}\n\
         Bytes saved:   {}",
        stats.total_requests,
        stats.hits,
        stats.misses,
        hit_rate,
        stats.disk_items,
        fmt_bytes(stats.total_disk_size_bytes),
        fmt_bytes(stats.data_served_from_cache_bytes),
    )
}
