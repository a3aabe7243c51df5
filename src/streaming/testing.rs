// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! In-memory publisher used by the scheduler tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{PublishError, Publisher, QosLevel};

/// One captured publish call
#[derive(Debug, Clone)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QosLevel,
    pub retain: bool,
    pub at: Instant,
}

impl Published {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// Records every call; optionally fails chosen topics or cancels a token
/// once a given number of telemetry publishes have been seen. An optional
/// delay models a slow transport.
#[derive(Default)]
pub struct RecordingPublisher {
    calls: Mutex<Vec<Published>>,
    failing: Mutex<HashSet<String>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
    delay: Mutex<Option<Duration>>,
    closed: Mutex<u32>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, topic: &str) {
        self.failing.lock().unwrap().insert(topic.to_string());
    }

    pub fn cancel_after(&self, telemetry_publishes: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((telemetry_publishes, token));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Published> {
        self.calls.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> u32 {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
        retain: bool,
    ) -> Result<(), PublishError> {
        let telemetry_seen = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Published {
                topic: topic.to_string(),
                payload,
                qos,
                retain,
                at: Instant::now(),
            });
            calls.iter().filter(|c| !c.retain).count()
        };

        if let Some((limit, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if telemetry_seen >= *limit {
                token.cancel();
            }
        }

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(topic) {
            return Err(PublishError::Transport(format!("refused {}", topic)));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        *self.closed.lock().unwrap() += 1;
        Ok(())
    }
}
