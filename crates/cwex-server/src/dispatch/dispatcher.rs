//! Resolves machines to topics and publishes commands to them.

use std::sync::Arc;

use cwex_core::{TopicPath, blink_payload};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use super::broker::{BrokerConnector, BrokerLink};
use super::config::DispatcherConfig;
use super::error::DispatchError;
use crate::registry::MachineRegistry;

/// What was sent, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchedCommand {
    pub topic: String,
    pub payload: String,
}

/// Owns the broker connection and publishes commands to machine topics.
///
/// The connection is opened lazily and replaced whenever it is found
/// disconnected at publish time. Concurrent publishers may each reconnect;
/// whichever stores its link last wins. Messages are never queued.
pub struct CommandDispatcher {
    registry: MachineRegistry,
    connector: Arc<dyn BrokerConnector>,
    link: RwLock<Option<Arc<dyn BrokerLink>>>,
    config: DispatcherConfig,
}

impl CommandDispatcher {
    pub fn new(
        registry: MachineRegistry,
        connector: Arc<dyn BrokerConnector>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            connector,
            link: RwLock::new(None),
            config,
        }
    }

    /// Open the broker connection. Calling again replaces the connection.
    pub async fn initialize(&self) -> Result<(), DispatchError> {
        self.reconnect().await?;
        info!("Command dispatcher ready");
        Ok(())
    }

    /// Whether a live broker connection is currently held.
    pub async fn is_connected(&self) -> bool {
        self.link
            .read()
            .await
            .as_ref()
            .is_some_and(|link| link.is_connected())
    }

    /// The task topic of a machine, from its current record.
    pub async fn resolve_topic(&self, machine_id: &str) -> Result<TopicPath, DispatchError> {
        let machine = self.registry.get(machine_id).await?;
        Ok(TopicPath::for_machine(
            &self.config.namespace,
            &machine.triple(),
        ))
    }

    /// Publish `message` to `topic`, reconnecting first if needed.
    #[instrument(skip(self, message))]
    pub async fn publish(&self, topic: &str, message: &str) -> Result<(), DispatchError> {
        let current = self.link.read().await.clone();
        let link = match current {
            Some(link) if link.is_connected() => link,
            _ => {
                warn!("Broker connection not available, reconnecting");
                self.reconnect().await?
            }
        };
        link.publish(topic, message).await
    }

    /// Send the blink command `on <amount>` to `topic`.
    pub async fn send_command(
        &self,
        topic: &TopicPath,
        amount: u32,
    ) -> Result<DispatchedCommand, DispatchError> {
        let payload = blink_payload(amount);
        self.publish(topic.as_str(), &payload).await?;
        Ok(DispatchedCommand {
            topic: topic.to_string(),
            payload,
        })
    }

    /// Resolve a machine's topic and blink it.
    #[instrument(skip(self))]
    pub async fn blink(
        &self,
        machine_id: &str,
        amount: u32,
    ) -> Result<DispatchedCommand, DispatchError> {
        let topic = self.resolve_topic(machine_id).await?;
        let sent = self.send_command(&topic, amount).await?;
        info!(topic = %sent.topic, payload = %sent.payload, "Command dispatched");
        Ok(sent)
    }

    async fn reconnect(&self) -> Result<Arc<dyn BrokerLink>, DispatchError> {
        let link = tokio::time::timeout(self.config.connect_timeout, self.connector.connect())
            .await
            .map_err(|_| {
                DispatchError::Unreachable(format!(
                    "no connection within {}s",
                    self.config.connect_timeout.as_secs_f32()
                ))
            })??;

        *self.link.write().await = Some(Arc::clone(&link));
        Ok(link)
    }
}
