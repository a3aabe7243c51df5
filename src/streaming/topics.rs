// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! Topic layout: `iot/{site}/{room}/{device}/...`

use std::fmt;

use crate::sensors::{ChannelId, Payload};

/// Topic prefix owned by one simulated device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicNamespace {
    site: String,
    room: String,
    device: String,
}

impl TopicNamespace {
    pub fn new(site: &str, room: &str, device: &str) -> Self {
        Self {
            site: site.to_string(),
            room: room.to_string(),
            device: device.to_string(),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn base(&self) -> String {
        format!("iot/{}/{}/{}", self.site, self.room, self.device)
    }

    pub fn environmental(&self) -> String {
        format!("{}/telemetry/bme688", self.base())
    }

    pub fn particulate(&self) -> String {
        format!("{}/telemetry/sps30", self.base())
    }

    pub fn pressure_drop(&self, channel: ChannelId) -> String {
        format!("{}/telemetry/dp/{}", self.base(), channel)
    }

    pub fn status(&self) -> String {
        format!("{}/status", self.base())
    }

    pub fn topic_for(&self, payload: &Payload) -> String {
        match payload {
            Payload::Environmental(_) => self.environmental(),
            Payload::Particulate(_) => self.particulate(),
            Payload::PressureDrop { channel, .. } => self.pressure_drop(*channel),
            Payload::Status(_) => self.status(),
        }
    }
}

impl fmt::Display for TopicNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base())
    }
}
