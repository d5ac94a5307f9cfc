//! `velo watch` -- live event tail over the full monitor.
//!
//! Drives the sync core the same way a dashboard would: hydrate, open the
//! stream, and print events as they arrive until interrupted. Connection
//! state goes to stderr so piped output stays clean.

use velocache_core::{HandlerSet, Monitor};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::{self, Config};
use crate::error::{CliError, core_error};
use crate::output::fmt_bytes;

pub async fn handle(args: WatchArgs, global: &GlobalOpts, config: &Config) -> Result<(), CliError> {
    let monitor_config = config::build_monitor_config(global, config)?;
    let server = monitor_config.base_url.clone();
    let monitor = Monitor::new(monitor_config).map_err(|e| core_error(e, &server))?;

    let mut handlers = HandlerSet::new()
        .on_open(|| eprintln!("-- connected --"))
        .on_close(|| eprintln!("-- disconnected, retrying --"))
        .on_flow(|flow| {
            let verdict = if flow.is_hit { "HIT " } else { "MISS" };
            println!(
                "{verdict} {:>3} {:<4} {} ({})",
                flow.status_code,
                flow.method,
                flow.uri,
                fmt_bytes(flow.response_size_bytes)
            );
        });

    if !args.no_logs {
        handlers = handlers.on_log(|line| println!("log  {line}"));
    }
    if args.stats {
        handlers = handlers.on_stats(|stats| {
            let hit_rate = stats
                .hit_rate()
                .map_or_else(|| "n/a".to_owned(), |r| format!("{r:.1}%"));
            println!(
                "stat {} requests, {} hits ({hit_rate}), {} saved",
                stats.total_requests,
                stats.hits,
                fmt_bytes(stats.data_served_from_cache_bytes)
            );
        });
    }

    let subscription = monitor.subscribe(handlers);
    monitor.start().await;

    eprintln!("watching {server} -- press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    subscription.unsubscribe();
    monitor.shutdown().await;
    Ok(())
}
