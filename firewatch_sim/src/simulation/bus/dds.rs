// firewatch_sim/src/simulation/bus/dds.rs

//! UDP client for the environment's broker.
//!
//! Sends go out with `try_send_to` so that `publish` never waits. A background
//! task receives PUBLISH packets into the topic table and keeps the broker's
//! session alive.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::simulation::bus::codec::{self, Packet};
use crate::simulation::bus::{Bus, TopicTable, Value};
use crate::simulation::config::structs::BusConfig;
use crate::simulation::core::error::{SimError, SimResult};

/// Largest datagram the receiver accepts.
const RECV_BUFFER: usize = 2048;

pub struct DdsBus {
    socket: Arc<UdpSocket>,
    broker: SocketAddr,
    table: Arc<TopicTable>,
    shutdown: watch::Sender<bool>,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl DdsBus {
    /// Binds an ephemeral local port, announces itself to the broker and
    /// starts the receiver task.
    pub async fn connect(config: &BusConfig) -> SimResult<Self> {
        config.validate()?;
        let address = format!("{}:{}", config.host, config.port);
        let broker = tokio::net::lookup_host(&address)
            .await?
            .next()
            .ok_or_else(|| SimError::UnresolvedBroker(address.clone()))?;

        let bind = if broker.is_ipv4() {
            SocketAddr::from(([0u8; 4], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = Arc::new(UdpSocket::bind(bind).await?);
        socket.send_to(&codec::KEEP_ALIVE, broker).await?;
        info!(%broker, local = %socket.local_addr()?, "connected to broker");

        let table = Arc::new(TopicTable::new());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let receiver = tokio::spawn(receive_loop(
            Arc::clone(&socket),
            broker,
            Arc::clone(&table),
            Duration::from_secs_f64(config.keep_alive_secs),
            shutdown_rx,
        ));

        Ok(Self {
            socket,
            broker,
            table,
            shutdown,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    /// Stops the receiver task and waits for it to finish.
    pub async fn close(&self) -> SimResult<()> {
        self.shutdown.send_replace(true);
        let handle = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.await.map_err(SimError::BusReceiver)?;
            debug!("bus receiver stopped");
        }
        Ok(())
    }

    fn send(&self, packet: &[u8]) {
        if let Err(e) = self.socket.try_send_to(packet, self.broker) {
            debug!(error = %e, "dropped outgoing packet");
        }
    }
}

impl Bus for DdsBus {
    fn subscribe(&self, keys: &[String]) -> SimResult<()> {
        for key in keys {
            self.table.register(key);
        }
        for packet in codec::encode_subscribe(keys)? {
            self.send(&packet);
        }
        debug!(count = keys.len(), "subscribed");
        Ok(())
    }

    fn publish(&self, key: &str, value: Value) {
        match codec::encode_publish(key, value) {
            Ok(packet) => self.send(&packet),
            Err(e) => warn!(key, error = %e, "cannot encode publish"),
        }
    }

    fn read(&self, key: &str) -> Option<f64> {
        self.table.read(key)
    }

    fn watch(&self, key: &str) -> SimResult<watch::Receiver<Option<f64>>> {
        self.table.watch(key)
    }
}

async fn receive_loop(
    socket: Arc<UdpSocket>,
    broker: SocketAddr,
    table: Arc<TopicTable>,
    keep_alive: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = [0u8; RECV_BUFFER];
    let mut ticker = tokio::time::interval(keep_alive);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                if let Err(e) = socket.send_to(&codec::KEEP_ALIVE, broker).await {
                    warn!(error = %e, "keep-alive failed");
                }
            }
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, _)) => handle_datagram(&table, &buf[..len]),
                Err(e) => warn!(error = %e, "receive failed"),
            },
        }
    }
}

fn handle_datagram(table: &TopicTable, datagram: &[u8]) {
    match codec::decode(datagram) {
        Ok(Packet::Publish { name, value }) => {
            if !table.update(&name, value.as_f64()) {
                trace!(key = %name, "value for unsubscribed key");
            }
        }
        Ok(other) => trace!(packet = ?other, "ignored packet"),
        Err(e) => warn!(error = %e, len = datagram.len(), "malformed packet"),
    }
}
