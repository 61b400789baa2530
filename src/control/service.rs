use std::{future::Future, pin::Pin, sync::Arc};

use anyhow::Result;
use rumqttc::{AsyncClient, QoS};
use serde::Serialize;
use tracing::info;

use crate::mqtt::CONTROL_TOPIC;

pub type PublishFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Outbound half of the message bus used for relay commands.
///
/// Implemented for `rumqttc::AsyncClient`, which fails fast when its request
/// queue is full; tests substitute a recorder.
pub trait ControlBus: Send + Sync {
    fn send<'a>(&'a self, topic: &'a str, payload: Vec<u8>) -> PublishFuture<'a>;
}

impl ControlBus for AsyncClient {
    fn send<'a>(&'a self, topic: &'a str, payload: Vec<u8>) -> PublishFuture<'a> {
        // Never wait for queue space: the queue only drains while the broker is reachable.
        Box::pin(async move {
            self.try_publish(topic, QoS::AtLeastOnce, false, payload)?;
            Ok(())
        })
    }
}

/// Body of a `smartenergy/control` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlCommand {
    pub relay: bool,
}

#[derive(Clone)]
pub struct ControlService {
    bus: Arc<dyn ControlBus>,
}

impl ControlService {
    pub fn new(bus: Arc<dyn ControlBus>) -> Self {
        Self { bus }
    }

    /// Hands `{"relay": <relay>}` to the bus client for the control topic.
    ///
    /// Returns once the client has queued the message; there is no
    /// confirmation that the device received or applied it.
    pub async fn publish(&self, relay: bool) -> Result<()> {
        let payload = serde_json::to_vec(&ControlCommand { relay })?;
        self.bus.send(CONTROL_TOPIC, payload).await?;
        info!(relay, topic = CONTROL_TOPIC, "Published control command");
        Ok(())
    }
}
