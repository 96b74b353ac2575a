use std::time::Instant;

use crate::bus::{MessageBus, Subscription};
use crate::catalog::client::CatalogStore;
use crate::catalog::query::{CatalogQueryBuilder, DEFAULT_TABLE};
use crate::interface::payload::ResultFormatter;
use crate::interface::pointing::Pointing;
use crate::math::geometry::{GeometryEngine, DISH_DIAMETER_M};
use crate::prelude::{SelectorError, SelectorResult};
use crate::processing::retry::RetryPolicy;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{Metrics, MetricsRecorder};

/// Channel names and tuning for one listener instance.
#[derive(Debug, Clone)]
pub struct ListenerSettings {
    pub pointing_channel: String,
    pub targets_channel: String,
    pub table: String,
    pub dish_diameter_m: f64,
    pub retry: RetryPolicy,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            pointing_channel: "pointing_channel".to_string(),
            targets_channel: "targets_channel".to_string(),
            table: DEFAULT_TABLE.to_string(),
            dish_diameter_m: DISH_DIAMETER_M,
            retry: RetryPolicy::default(),
        }
    }
}

/// Lifecycle of a listener. `state()` reports `Idle` or `Subscribed`;
/// `Processing` is held only for the duration of a `handle_message` call,
/// which borrows the listener mutably, so callers never observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Subscribed,
    Processing,
}

/// Result of handling one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Published { key: String, matches: usize },
    Dropped(String),
    Failed(String),
}

/// Turns pointing events into published target lists, one message at a time.
pub struct PointingListener<B: MessageBus, C: CatalogStore> {
    bus: B,
    catalog: C,
    settings: ListenerSettings,
    query_builder: CatalogQueryBuilder,
    state: ListenerState,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl<B: MessageBus, C: CatalogStore> PointingListener<B, C> {
    pub fn new(bus: B, catalog: C, settings: ListenerSettings) -> SelectorResult<Self> {
        if !(settings.dish_diameter_m.is_finite() && settings.dish_diameter_m > 0.0) {
            return Err(SelectorError::Configuration(format!(
                "dish diameter {} must be positive",
                settings.dish_diameter_m
            )));
        }
        let query_builder = CatalogQueryBuilder::new(settings.table.clone())?;
        Ok(Self {
            bus,
            catalog,
            settings,
            query_builder,
            state: ListenerState::Idle,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("selector::listener"),
        })
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    pub fn settings(&self) -> &ListenerSettings {
        &self.settings
    }

    /// Opens the persistent subscription to the pointing channel.
    pub fn subscribe(&mut self) -> SelectorResult<B::Subscription> {
        let subscription = self.bus.subscribe(&self.settings.pointing_channel)?;
        self.state = ListenerState::Subscribed;
        self.logger.record(&format!(
            "listening for pointings on {}",
            self.settings.pointing_channel
        ));
        Ok(subscription)
    }

    /// Blocks on the subscription, handling messages in arrival order until the bus closes it.
    pub fn serve(&mut self, mut subscription: B::Subscription) {
        while let Some(message) = subscription.next_message() {
            self.handle_message(&message);
        }
        self.state = ListenerState::Idle;
        self.logger.record(&format!(
            "subscription to {} closed",
            self.settings.pointing_channel
        ));
    }

    pub fn start(&mut self) -> SelectorResult<()> {
        let subscription = self.subscribe()?;
        self.serve(subscription);
        Ok(())
    }

    pub fn handle_message(&mut self, raw: &str) -> ProcessOutcome {
        self.metrics.record_received();
        let previous = self.state;
        self.state = ListenerState::Processing;

        let outcome = match Pointing::parse(raw) {
            Err(err) => {
                self.logger
                    .warn(&format!("unrecognised message {:?}: {}", raw, err));
                self.metrics.record_dropped();
                ProcessOutcome::Dropped(err.to_string())
            }
            Ok(pointing) => match self.process(&pointing) {
                Ok((key, matches)) => {
                    self.metrics.record_published();
                    ProcessOutcome::Published { key, matches }
                }
                Err(err) => {
                    self.logger.error(&format!(
                        "abandoning pointing {}: {}",
                        pointing.observation_id(),
                        err
                    ));
                    self.metrics.record_failed();
                    ProcessOutcome::Failed(err.to_string())
                }
            },
        };

        self.state = match previous {
            ListenerState::Idle => ListenerState::Idle,
            _ => ListenerState::Subscribed,
        };
        outcome
    }

    fn process(&self, pointing: &Pointing) -> SelectorResult<(String, usize)> {
        let observation_id = pointing.observation_id();
        self.logger.record(&format!(
            "calculating for {} at ({}, {})",
            pointing.target_name, pointing.ra_deg, pointing.dec_deg
        ));

        let (ra, dec) = (pointing.ra_rad(), pointing.dec_rad());
        let radius = GeometryEngine::beam_radius_for_dish(
            pointing.center_frequency_mhz,
            self.settings.dish_diameter_m,
        );
        let boxes = GeometryEngine::bounding_boxes(ra, dec, radius);
        if boxes.is_empty() {
            self.logger.warn(&format!(
                "beam radius {:.4} rad too large for a box pre-filter; scanning full catalog",
                radius
            ));
        }
        let query = self.query_builder.build(&boxes, ra, dec, radius);

        let started = Instant::now();
        let records = self
            .settings
            .retry
            .run("catalog query", &self.logger, || self.catalog.fetch(&query))?;
        self.logger.record(&format!(
            "retrieved {} targets in field of view in {:.3} seconds",
            records.len(),
            started.elapsed().as_secs_f64()
        ));

        let payload = ResultFormatter::format(&records, pointing);
        let json = payload.to_json()?;
        let key = observation_id.targets_key();
        self.bus.set(&key, &json)?;
        self.bus.publish(&self.settings.targets_channel, &key)?;
        Ok((key, payload.match_count()))
    }
}
