// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! Fixed-interval publish loop with online/offline lifecycle

use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::sensors::{DeviceSimulator, Payload};
use crate::streaming::{PublishError, Publisher, QosLevel, TopicNamespace};

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Counters accumulated over the scheduler's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishStats {
    pub rounds: u64,
    pub attempted: u64,
    pub published: u64,
    pub failed: u64,
    /// Rounds whose processing took the whole interval or longer
    pub overruns: u64,
}

/// Outcome of a single round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub attempted: usize,
    pub failed: usize,
}

/// Time left to sleep after a round that took `elapsed`.
///
/// Zero when the round overran; missed periods are not replayed.
pub fn sleep_budget(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Drives every device once per interval and owns the publish channel.
pub struct PublishScheduler<R: Rng = StdRng> {
    devices: Vec<DeviceSimulator<R>>,
    publisher: Arc<dyn Publisher>,
    interval: Duration,
    qos: QosLevel,
    state: SchedulerState,
    stats: PublishStats,
}

impl PublishScheduler<StdRng> {
    /// One entropy-seeded device per configured name.
    pub fn from_config(config: &Config, publisher: Arc<dyn Publisher>) -> Self {
        let emulator = &config.emulator;
        let devices = emulator
            .devices
            .iter()
            .map(|name| {
                let namespace = TopicNamespace::new(&emulator.site, &emulator.room, name);
                DeviceSimulator::from_entropy(namespace, &emulator.dp_channels)
                    .with_firmware(&emulator.firmware)
            })
            .collect();

        Self::new(devices, publisher, emulator.interval(), config.mqtt.qos)
    }
}

impl<R: Rng> PublishScheduler<R> {
    pub fn new(
        devices: Vec<DeviceSimulator<R>>,
        publisher: Arc<dyn Publisher>,
        interval: Duration,
        qos: QosLevel,
    ) -> Self {
        Self {
            devices,
            publisher,
            interval,
            qos,
            state: SchedulerState::Starting,
            stats: PublishStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> &PublishStats {
        &self.stats
    }

    /// Announce every device online (retained) and enter `Running`.
    pub async fn start(&mut self) {
        if self.state != SchedulerState::Starting {
            return;
        }

        self.announce(true).await;
        self.state = SchedulerState::Running;
    }

    /// Sample and publish every topic of every device once. Failures are
    /// counted and logged; the round always runs to the end.
    pub async fn run_round(&mut self) -> RoundReport {
        let timestamp = Utc::now();
        let mut report = RoundReport::default();

        let Self { devices, publisher, qos, stats, .. } = self;
        for device in devices.iter_mut() {
            let payloads = device.tick(timestamp);
            for payload in &payloads {
                report.attempted += 1;
                if !deliver(&**publisher, stats, device.namespace(), payload, *qos).await {
                    report.failed += 1;
                }
            }
        }

        self.stats.rounds += 1;
        debug!(
            "Round {}: {} publishes, {} failed",
            self.stats.rounds, report.attempted, report.failed
        );
        report
    }

    /// Announce every device offline (retained) exactly once, then release
    /// the publish channel. Later calls do nothing.
    pub async fn shutdown(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.state = SchedulerState::Stopping;

        self.announce(false).await;

        if let Err(e) = self.publisher.close().await {
            warn!("Error releasing publish channel: {}", e);
        }

        self.state = SchedulerState::Stopped;
        info!(
            "Publisher stopped after {} rounds: {} published, {} failed, {} overruns",
            self.stats.rounds, self.stats.published, self.stats.failed, self.stats.overruns
        );
    }

    /// Full lifecycle: start, publish every interval until `cancel` fires,
    /// then shut down. Cancellation is checked between rounds only.
    pub async fn run(mut self, cancel: CancellationToken) -> PublishStats {
        self.start().await;

        while !cancel.is_cancelled() {
            let started = Instant::now();
            self.run_round().await;

            let elapsed = started.elapsed();
            let pause = sleep_budget(self.interval, elapsed);
            if pause.is_zero() {
                self.stats.overruns += 1;
                warn!(
                    "Round took {:?}, longer than the {:?} interval; starting next round immediately",
                    elapsed, self.interval
                );
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = cancel.cancelled() => {}
            }
        }

        info!("Stop requested, announcing devices offline...");
        self.shutdown().await;
        self.stats
    }

    async fn announce(&mut self, online: bool) {
        let timestamp = Utc::now();
        let Self { devices, publisher, qos, stats, .. } = self;

        for device in devices.iter_mut() {
            let payload = Payload::Status(device.status_snapshot(online, timestamp));
            if deliver(&**publisher, stats, device.namespace(), &payload, *qos).await {
                info!("{} {}", device.name(), if online { "online" } else { "offline" });
            }
        }
    }
}

/// Encode and publish one payload, returning whether it went out.
async fn deliver(
    publisher: &dyn Publisher,
    stats: &mut PublishStats,
    namespace: &TopicNamespace,
    payload: &Payload,
    qos: QosLevel,
) -> bool {
    let topic = namespace.topic_for(payload);
    stats.attempted += 1;

    let result = match payload.encode() {
        Ok(body) => publisher.publish(&topic, body, qos, payload.retained()).await,
        Err(e) => Err(PublishError::from(e)),
    };

    match result {
        Ok(()) => {
            stats.published += 1;
            true
        }
        Err(e) => {
            stats.failed += 1;
            warn!("Publish to {} failed: {}", topic, e);
            false
        }
    }
}
