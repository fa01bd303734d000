use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    sync::mpsc,
    time::{Instant, SystemTime},
};

use log::{debug, info, warn};
use renet::{
    transport::{ClientAuthentication, NetcodeClientTransport},
    ConnectionConfig, DefaultChannel, RenetClient,
};
use tokio::{
    runtime::Handle,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    time,
};

use crate::{
    config::NetworkConfig,
    error::{GameError, Result},
    message::{encode_answer, Message},
    server::{LINGER, TICK},
};

enum Outbound {
    Send(String),
    Disconnect { done: mpsc::Sender<()> },
}

/// A remote seat's end of the connection.
pub struct Client {
    inbound: mpsc::Receiver<Result<String>>,
    outbound: UnboundedSender<Outbound>,
}

impl Client {
    /// Connects to the server at `config.host:config.port`.
    pub fn connect(config: &NetworkConfig, runtime: &Handle) -> Result<Self> {
        let server_addr = config.address();
        let local = match server_addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let socket = UdpSocket::bind(SocketAddr::new(local, 0)).map_err(transport_error)?;
        let current_time = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| GameError::Internal(e.to_string()))?;
        let authentication = ClientAuthentication::Unsecure {
            server_addr,
            client_id: rand::random(),
            user_data: None,
            protocol_id: config.protocol_id,
        };
        let transport = NetcodeClientTransport::new(current_time, authentication, socket)
            .map_err(transport_error)?;
        let client = RenetClient::new(ConnectionConfig::default());

        let (inbound_tx, inbound) = mpsc::channel();
        let (outbound, outbound_rx) = unbounded_channel();
        runtime.spawn(pump(client, transport, inbound_tx, outbound_rx));
        info!("connecting to {server_addr}");

        Ok(Client { inbound, outbound })
    }

    /// Blocks for the next message from the server.
    pub fn await_message(&self) -> Result<Message> {
        let text = self
            .inbound
            .recv()
            .map_err(|_| GameError::Transport("connection closed".to_string()))??;
        Message::decode(&text)
    }

    /// Answers the last `Play` request.
    pub fn respond(&self, answer: i64) -> Result<()> {
        self.outbound
            .send(Outbound::Send(encode_answer(answer)))
            .map_err(|_| GameError::Transport("connection closed".to_string()))
    }

    /// Flushes pending answers, then leaves. Blocks until the connection is
    /// closed.
    pub fn disconnect(&self) {
        let (done, closed) = mpsc::channel();
        if self.outbound.send(Outbound::Disconnect { done }).is_err() {
            return;
        }
        // the pump drops `done` when it stops early
        if let Err(mpsc::RecvTimeoutError::Timeout) = closed.recv_timeout(LINGER * 4) {
            warn!("network did not confirm disconnect");
        }
    }
}

fn transport_error<E: std::fmt::Display>(e: E) -> GameError {
    GameError::Transport(e.to_string())
}

async fn pump(
    mut client: RenetClient,
    mut transport: NetcodeClientTransport,
    inbound: mpsc::Sender<Result<String>>,
    mut outbound: UnboundedReceiver<Outbound>,
) {
    let mut interval = time::interval(TICK);
    let mut last_updated = Instant::now();
    let mut announced = false;
    let mut closing: Option<(Instant, Option<mpsc::Sender<()>>)> = None;

    loop {
        let now = Instant::now();
        let duration = now - last_updated;
        last_updated = now;

        client.update(duration);
        let updated = transport.update(duration, &mut client);

        if client.is_connected() && !announced {
            announced = true;
            info!("connected to server");
        }

        // whatever arrived before a disconnect is still delivered
        while let Some(message) = client.receive_message(DefaultChannel::ReliableOrdered) {
            let text = String::from_utf8_lossy(&message).into_owned();
            debug!("received {text:?}");
            if inbound.send(Ok(text)).is_err() {
                transport.disconnect();
                return;
            }
        }

        if let Err(e) = updated {
            let _ = inbound.send(Err(transport_error(e)));
            return;
        }
        if client.is_disconnected() {
            let reason = client
                .disconnect_reason()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "disconnected".to_string());
            let _ = inbound.send(Err(GameError::Transport(reason)));
            return;
        }

        if let Err(e) = transport.send_packets(&mut client) {
            warn!("could not send packets: {e}");
        }

        if matches!(&closing, Some((deadline, _)) if Instant::now() >= *deadline) {
            transport.disconnect();
            info!("disconnected from server");
            if let Some((_, Some(done))) = closing.take() {
                let _ = done.send(());
            }
            return;
        }

        tokio::select! {
            _ = interval.tick() => {}
            command = outbound.recv(), if closing.is_none() => match command {
                Some(Outbound::Send(text)) => {
                    client.send_message(DefaultChannel::ReliableOrdered, text.into_bytes());
                }
                Some(Outbound::Disconnect { done }) => {
                    closing = Some((Instant::now() + LINGER, Some(done)));
                }
                None => {
                    closing = Some((Instant::now() + LINGER, None));
                }
            }
        }
    }
}
