use fold_store::{Store, Subscription};
use futures::StreamExt;
use std::sync::Arc;

mod actions;
mod config;
mod logger;
mod middleware;
mod reducer;
mod state;

use actions::CounterAction;
use config::{ConfigSource, CounterConfig};
use middleware::StatsMiddleware;
use state::CounterState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = CounterConfig::load();

    // Initialize logger
    let log_file = logger::init(config.log_dir.as_deref())?;

    log::info!("Starting fold-counter");
    match &source {
        ConfigSource::File(path) => log::info!("Loaded config from {}", path.display()),
        ConfigSource::Invalid(path, e) => {
            log::warn!("Failed to parse {}: {}, using defaults", path.display(), e)
        }
        ConfigSource::Defaults => log::debug!("Using default config"),
    }
    if let Some(path) = &log_file {
        log::info!("Logging to {}", path.display());
    }

    let stats = Arc::new(StatsMiddleware::new());
    let store = Store::<CounterState, CounterAction>::builder(CounterState::new(config.start), reducer::reduce)
        .config(config.store.clone())
        .middleware(Arc::clone(&stats))
        .build()?;

    if let Some(limit) = config.limit {
        store.set_override_hook(move |state: CounterState, _: &CounterAction| {
            state.clamped(limit)
        });
    }

    let printer = tokio::spawn(print_states(store.states()));
    let total = tokio::spawn(count_snapshots(store.indistinct_states()));

    // Single dispatches
    for _ in 0..config.ticks {
        store.dispatch(CounterAction::Increment)?;
    }
    store.dispatch(CounterAction::Refresh)?;

    // A scripted sequence, forwarded by its own task
    let script = vec![
        CounterAction::Add(config.step),
        CounterAction::Refresh,
        CounterAction::Add(-2 * config.step),
        CounterAction::Decrement,
        CounterAction::Reset,
        CounterAction::Add(config.step),
    ];
    let forwarded = store.dispatch_iter(script).join().await?;
    log::debug!("Scripted sequence forwarded {} actions", forwarded);

    store.dispatch(CounterAction::Finish)?;

    printer.await??;
    let snapshots = total.await?;

    println!(
        "{} snapshots, {} reductions, {} changed the count, final count {}",
        snapshots,
        stats.reductions(),
        stats.changes(),
        store.state().count
    );

    log::info!("Exiting fold-counter");
    Ok(())
}

/// Print every state change until the run finishes
async fn print_states(mut states: Subscription<CounterState, CounterAction>) -> anyhow::Result<()> {
    while let Some(item) = states.next().await {
        let snapshot = item?;
        let label = match snapshot.action() {
            Some(action) => format!("{:?}", action),
            None => "start".to_string(),
        };
        println!(
            "#{:<3} {:<12} count = {}",
            snapshot.sequence(),
            label,
            snapshot.state().count
        );
        if snapshot.state().finished {
            break;
        }
    }
    Ok(())
}

/// Count every snapshot, changed or not, until the run finishes
async fn count_snapshots(mut states: Subscription<CounterState, CounterAction>) -> usize {
    let mut seen = 0;
    while let Some(Ok(snapshot)) = states.recv().await {
        seen += 1;
        if snapshot.state().finished {
            break;
        }
    }
    seen
}
