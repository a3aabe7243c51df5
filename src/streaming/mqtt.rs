// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! MQTT publisher backed by rumqttc

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{PublishError, Publisher, QosLevel};
use crate::config::MqttConfig;

/// Pause before the event loop polls again after a broker error
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// Upper bound on waiting for queued packets to flush on close
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Outgoing request queue depth. Publishes beyond it fail instead of waiting.
const REQUEST_CAPACITY: usize = 100;

/// MQTT client wrapper
pub struct MqttPublisher {
    client: AsyncClient,
    event_loop: Mutex<Option<JoinHandle<()>>>,
    endpoint: String,
}

impl MqttPublisher {
    /// Configure the client and spawn its event loop. Must be called inside a
    /// tokio runtime; the connection itself is established by the event loop.
    pub fn connect(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        if config.username.is_some() || config.password.is_some() {
            options.set_credentials(
                config.username.clone().unwrap_or_default(),
                config.password.clone().unwrap_or_default(),
            );
        }

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let endpoint = format!("mqtt://{}:{}", config.host, config.port);

        let handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        info!("Connected to broker ({:?})", ack.code);
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        debug!("MQTT disconnect sent, stopping event loop");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT error: {:?}", e);
                        tokio::time::sleep(RECONNECT_PAUSE).await;
                    }
                }
            }
        });

        info!("MQTT client initialized for {}", endpoint);

        Self {
            client,
            event_loop: Mutex::new(Some(handle)),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
        retain: bool,
    ) -> Result<(), PublishError> {
        // Never wait on the queue: with the broker down nothing drains it
        self.client
            .try_publish(topic, qos.into(), retain, payload)
            .map_err(|e| PublishError::Transport(e.to_string()))
    }

    async fn close(&self) -> Result<(), PublishError> {
        let mut handle = match self.event_loop.lock().await.take() {
            Some(handle) => handle,
            None => return Err(PublishError::Closed),
        };

        // Queued behind any pending publishes, so those go out first
        if let Err(e) = self.client.try_disconnect() {
            handle.abort();
            return Err(PublishError::Transport(e.to_string()));
        }

        match tokio::time::timeout(DRAIN_TIMEOUT, &mut handle).await {
            Ok(Ok(())) => {
                info!("Disconnected from {}", self.endpoint);
                Ok(())
            }
            Ok(Err(e)) => {
                error!("MQTT event loop task failed: {}", e);
                Err(PublishError::Transport(e.to_string()))
            }
            Err(_) => {
                warn!("MQTT event loop did not drain within {:?}", DRAIN_TIMEOUT);
                handle.abort();
                Err(PublishError::Transport("disconnect timed out".to_string()))
            }
        }
    }
}
