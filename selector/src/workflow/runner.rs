use crate::workflow::config::SelectorConfig;
use anyhow::{anyhow, Context};
use selectorcore::bus::{MemoryBus, MessageBus, Subscription};
use selectorcore::catalog::CatalogStore;
use selectorcore::telemetry::Metrics;
use selectorcore::PointingListener;
use std::io::{BufRead, Write};
use std::thread;

/// A published result: the announced key and the payload stored under it.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedTargets {
    pub key: String,
    pub payload: Option<String>,
}

pub struct RunSummary {
    pub metrics: Metrics,
    /// Number of `<key> <payload>` lines written.
    pub written: u64,
    pub last_published: Option<PublishedTargets>,
}

pub struct Runner {
    config: SelectorConfig,
}

impl Runner {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Runs a listener on its own thread and feeds it every non-empty line of
    /// `input` as a pointing message. Each result is written to `output` as
    /// soon as it is announced on the targets channel. Returns once `input`
    /// is exhausted and all messages have been handled.
    pub fn execute<C, R, W>(&self, catalog: C, input: R, mut output: W) -> anyhow::Result<RunSummary>
    where
        C: CatalogStore + Send,
        R: BufRead,
        W: Write + Send,
    {
        let settings = self.config.to_listener_settings();
        let bus = MemoryBus::new();
        let mut listener = PointingListener::new(bus.clone(), catalog, settings)
            .context("initializing pointing listener")?;
        let subscription = listener
            .subscribe()
            .context("subscribing to pointing channel")?;
        let targets = bus
            .subscribe(&self.config.targets_channel)
            .context("subscribing to targets channel")?;

        thread::scope(|scope| -> anyhow::Result<RunSummary> {
            let serving = scope.spawn(move || {
                listener.serve(subscription);
                listener.metrics()
            });
            let results_bus = bus.clone();
            let draining = scope.spawn(move || drain_targets(&results_bus, targets, &mut output));

            let fed = self.feed(&bus, input);

            // Both channels close even when feeding failed so the workers exit.
            bus.close(&self.config.pointing_channel)?;
            let metrics = serving
                .join()
                .map_err(|_| anyhow!("pointing listener thread panicked"))?;
            bus.close(&self.config.targets_channel)?;
            let (written, last_published) = draining
                .join()
                .map_err(|_| anyhow!("target writer thread panicked"))??;
            fed?;

            Ok(RunSummary {
                metrics,
                written,
                last_published,
            })
        })
    }

    fn feed<R: BufRead>(&self, bus: &MemoryBus, input: R) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line.context("reading pointing input")?;
            let message = line.trim();
            if message.is_empty() {
                continue;
            }
            bus.publish(&self.config.pointing_channel, message)
                .context("publishing pointing")?;
        }
        Ok(())
    }
}

fn drain_targets<S: Subscription, W: Write>(
    bus: &MemoryBus,
    mut targets: S,
    output: &mut W,
) -> anyhow::Result<(u64, Option<PublishedTargets>)> {
    let mut written = 0;
    let mut last = None;
    while let Some(key) = targets.next_message() {
        let payload = bus.get(&key)?;
        writeln!(output, "{} {}", key, payload.as_deref().unwrap_or("null"))
            .and_then(|_| output.flush())
            .context("writing target output")?;
        written += 1;
        last = Some(PublishedTargets { key, payload });
    }
    Ok((written, last))
}
