//! Streaming module - publish channel, topic layout and the MQTT transport

mod publisher;
mod topics;
mod mqtt;

#[cfg(test)]
pub(crate) mod testing;

pub use publisher::{PublishError, Publisher, QosLevel};
pub use topics::TopicNamespace;
pub use mqtt::MqttPublisher;
