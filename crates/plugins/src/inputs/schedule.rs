//! Schedule input - interval tick generator
//!
//! Emits an event on a fixed interval, optionally stopping after a
//! configured count. Useful for heartbeats, smoke tests and as a clock
//! for downstream batching.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `interval` | duration | `"1s"` | Tick period |
//! | `count` | int | `0` | Events to emit; 0 means unlimited |
//! | `routing_key` | string | `"schedule"` | Routing key of emitted events |

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use neptunus_core::decode::decode;
use neptunus_core::{CancellationToken, Event, EventTx, Input, Payload, PluginError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ScheduleConfig {
    #[serde(with = "humantime_serde")]
    interval: Duration,
    count: u64,
    routing_key: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            count: 0,
            routing_key: "schedule".to_owned(),
        }
    }
}

/// Interval tick generator
#[derive(Default)]
pub struct Schedule {
    alias: String,
    pipeline: String,
    config: ScheduleConfig,
    stop: Option<CancellationToken>,
    out: Option<EventTx>,
}

#[async_trait]
impl Input for Schedule {
    fn init(
        &mut self,
        conf: &toml::Table,
        alias: &str,
        pipeline: &str,
    ) -> Result<(), PluginError> {
        self.config = decode(conf)?;
        self.alias = alias.to_owned();
        self.pipeline = pipeline.to_owned();

        if self.config.interval.is_zero() {
            return Err(PluginError::config("interval must be greater than zero"));
        }
        Ok(())
    }

    fn set_channels(&mut self, stop: CancellationToken, out: EventTx) {
        self.stop = Some(stop);
        self.out = Some(out);
    }

    async fn run(&mut self) {
        let (Some(stop), Some(out)) = (self.stop.take(), self.out.take()) else {
            error!(
                pipeline = %self.pipeline,
                input = %self.alias,
                "schedule input started without channels"
            );
            return;
        };

        info!(
            pipeline = %self.pipeline,
            input = %self.alias,
            interval = ?self.config.interval,
            "schedule input started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        let mut sequence: u64 = 0;
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    let mut data = HashMap::new();
                    data.insert("sequence".to_owned(), Payload::Uint(sequence));
                    let event = Event::with_data(&self.config.routing_key, Payload::Mapping(data));

                    debug!(
                        pipeline = %self.pipeline,
                        input = %self.alias,
                        sequence,
                        "tick emitted"
                    );
                    if out.send(event).await.is_err() {
                        break;
                    }

                    sequence += 1;
                    if self.config.count > 0 && sequence >= self.config.count {
                        break;
                    }
                }
            }
        }

        info!(pipeline = %self.pipeline, input = %self.alias, "schedule input stopped");
    }
}
