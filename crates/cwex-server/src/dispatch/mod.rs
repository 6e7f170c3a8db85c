//! Command dispatch to machines over MQTT.
//!
//! - `broker` -- connection traits the dispatcher is written against
//! - `mqtt` -- the `rumqttc` implementation of those traits
//! - `dispatcher` -- topic resolution and reconnect-on-demand publishing

mod broker;
mod config;
mod dispatcher;
mod error;
mod mqtt;


pub use broker::{BrokerConnector, BrokerLink};
pub use config::{DispatcherConfig, MqttConfig};
pub use dispatcher::{CommandDispatcher, DispatchedCommand};
pub use error::DispatchError;
pub use mqtt::MqttConnector;
