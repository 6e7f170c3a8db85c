//! Message-bus connection traits.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::DispatchError;

/// Opens connections to the message broker.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// Connect and wait until the broker has accepted the session.
    async fn connect(&self) -> Result<Arc<dyn BrokerLink>, DispatchError>;
}

/// One established broker connection.
#[async_trait]
pub trait BrokerLink: Send + Sync {
    /// Whether the connection is still up.
    fn is_connected(&self) -> bool;

    /// Publish a plain-text payload to `topic`.
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), DispatchError>;
}
