use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, Outgoing, Publish, QoS};
use serde::Deserialize;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{config::Config, telemetry::TelemetryService};

pub const DATA_TOPIC: &str = "smartenergy/data";
pub const CONTROL_TOPIC: &str = "smartenergy/control";

const KEEP_ALIVE: Duration = Duration::from_secs(60);
const REQUEST_CAPACITY: usize = 32;
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Build the shared client and its event loop.
///
/// The client is cloned into the control publisher; the event loop is
/// driven by [`run_subscriber`]. Nothing touches the network until the
/// event loop is polled.
pub fn connect(config: &Config) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(
        config.mqtt_client_id.clone(),
        config.broker.host.clone(),
        config.broker.port,
    );
    options.set_keep_alive(KEEP_ALIVE);
    AsyncClient::new(options, REQUEST_CAPACITY)
}

/// Drives the MQTT event loop until a DISCONNECT has been sent.
///
/// Subscriptions are (re)issued on every `ConnAck`, since the broker
/// forgets them when a clean session reconnects. Reconnecting is left to
/// rumqttc: the next `poll` after an error starts a fresh connection.
pub async fn run_subscriber(client: AsyncClient, mut eventloop: EventLoop, telemetry: TelemetryService) {
    info!(topics = ?[DATA_TOPIC, CONTROL_TOPIC], "MQTT subscriber started");

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                info!("Connected to MQTT broker");
                spawn_subscriptions(&client);
            }
            Ok(Event::Incoming(Incoming::Publish(publish))) => {
                handle_publish(&telemetry, &publish).await;
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                info!("Disconnected from MQTT broker");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "MQTT connection error; reconnecting");
                sleep(POLL_ERROR_PAUSE).await;
            }
        }
    }
}

/// Queue the topic subscriptions from a separate task.
///
/// This runs on the event-loop task, which is the only consumer of the
/// client's request channel; awaiting channel space here would block it.
fn spawn_subscriptions(client: &AsyncClient) -> JoinHandle<()> {
    let client = client.clone();
    tokio::spawn(async move { subscribe_all(&client).await })
}

async fn subscribe_all(client: &AsyncClient) {
    for topic in [DATA_TOPIC, CONTROL_TOPIC] {
        if let Err(e) = client.subscribe(topic, QoS::AtLeastOnce).await {
            warn!(topic = %topic, error = %e, "Failed to subscribe");
        }
    }
}

#[derive(Debug, Deserialize)]
struct ControlEcho {
    relay: bool,
}

async fn handle_publish(telemetry: &TelemetryService, publish: &Publish) {
    match publish.topic.as_str() {
        DATA_TOPIC => {
            if let Err(e) = telemetry.ingest(&publish.payload).await {
                warn!(topic = %publish.topic, error = %e, "Discarding telemetry message");
            }
        }
        // Our own commands come back through the subscription; nothing acts on them.
        CONTROL_TOPIC => match serde_json::from_slice::<ControlEcho>(&publish.payload) {
            Ok(cmd) => debug!(relay = cmd.relay, "Observed control command on bus"),
            Err(e) => debug!(error = %e, "Unrecognised control topic payload"),
        },
        other => debug!(topic = %other, "Ignoring message on unexpected topic"),
    }
}
