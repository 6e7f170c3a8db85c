//! `rumqttc`-backed broker connection.
//!
//! Each connection owns a spawned task driving its event loop. The task
//! keeps the connected flag current and exits on the first connection
//! error; the dispatcher then opens a fresh connection on the next publish
//! instead of letting `rumqttc` retry in the background.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::broker::{BrokerConnector, BrokerLink};
use super::config::MqttConfig;
use super::error::DispatchError;

/// Opens MQTT connections to the configured broker.
pub struct MqttConnector {
    config: MqttConfig,
}

impl MqttConnector {
    pub const fn new(config: MqttConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(self.config.keep_alive);
        options.set_clean_session(true);
        if let Some((username, password)) = &self.config.credentials {
            options.set_credentials(username.clone(), password.clone());
        }
        options
    }
}

#[async_trait]
impl BrokerConnector for MqttConnector {
    async fn connect(&self) -> Result<Arc<dyn BrokerLink>, DispatchError> {
        let (client, mut event_loop) = AsyncClient::new(self.options(), self.config.channel_capacity);
        let connected = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), String>>();

        let flag = Arc::clone(&connected);
        let driver = tokio::spawn(async move {
            let mut ready_tx = Some(ready_tx);
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        flag.store(true, Ordering::SeqCst);
                        if let Some(tx) = ready_tx.take() {
                            let _ = tx.send(Ok(()));
                        }
                    }
                    Ok(event) => debug!(?event, "MQTT event"),
                    Err(e) => {
                        flag.store(false, Ordering::SeqCst);
                        match ready_tx.take() {
                            Some(tx) => {
                                let _ = tx.send(Err(e.to_string()));
                            }
                            None => warn!(error = %e, "MQTT connection lost"),
                        }
                        break;
                    }
                }
            }
        });

        // Dropping the link aborts the driver, also when the caller times out.
        let link = MqttLink {
            client,
            connected,
            driver,
        };

        match ready_rx.await {
            Ok(Ok(())) => {
                info!(
                    host = %self.config.host,
                    port = self.config.port,
                    client_id = %self.config.client_id,
                    "MQTT client connected"
                );
                Ok(Arc::new(link))
            }
            Ok(Err(reason)) => Err(DispatchError::Unreachable(reason)),
            Err(_) => Err(DispatchError::Unreachable(
                "event loop exited before connecting".to_string(),
            )),
        }
    }
}

struct MqttLink {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    driver: JoinHandle<()>,
}

#[async_trait]
impl BrokerLink for MqttLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.driver.is_finished()
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), DispatchError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
            .await
            .map_err(|e| DispatchError::Publish(e.to_string()))
    }
}

impl Drop for MqttLink {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
