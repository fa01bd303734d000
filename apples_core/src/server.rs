use std::{
    collections::HashMap,
    net::{SocketAddr, UdpSocket},
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError},
    thread,
    time::{Duration, Instant, SystemTime},
};

use log::{debug, error, info, warn};
use renet::{
    transport::{NetcodeServerTransport, ServerAuthentication, ServerConfig},
    ClientId, ConnectionConfig, DefaultChannel, RenetServer, ServerEvent,
};
use tokio::{
    runtime::Handle,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    time,
};

use crate::{
    config::NetworkConfig,
    error::{GameError, Result},
    message::{decode_answer, Message},
};

pub const ONLINE_PLAYER_PREFIX: &str = "online player";

pub(crate) const TICK: Duration = Duration::from_millis(50);
/// Time given to queued messages (the final `End` in particular) to reach
/// the clients before they are disconnected.
/// How long packets keep flowing after a close was requested.
pub(crate) const LINGER: Duration = Duration::from_millis(500);

struct Connection {
    name: String,
    client_id: ClientId,
}

/// Identities of the open connections. Written by the pump task only.
#[derive(Default)]
struct Roster {
    connections: Vec<Connection>,
    issued: usize,
}

impl Roster {
    fn admit(&mut self, client_id: ClientId) -> String {
        let name = format!("{} {}", ONLINE_PLAYER_PREFIX, self.issued);
        self.issued += 1;
        self.connections.push(Connection {
            name: name.clone(),
            client_id,
        });
        name
    }

    fn remove(&mut self, client_id: ClientId) -> Option<String> {
        let index = self
            .connections
            .iter()
            .position(|c| c.client_id == client_id)?;
        Some(self.connections.remove(index).name)
    }

    fn find(&self, name: &str) -> Option<ClientId> {
        self.connections
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.client_id)
    }
}

type Reply = mpsc::Sender<Result<String>>;

enum Command {
    Send {
        client_id: ClientId,
        message: Message,
    },
    Request {
        client_id: ClientId,
        message: Message,
        reply: Reply,
    },
    Close {
        done: mpsc::Sender<()>,
    },
}

/// Host side of the transport. Cloning shares the same connections.
#[derive(Clone)]
pub struct Server {
    address: SocketAddr,
    roster: Arc<Mutex<Roster>>,
    commands: UnboundedSender<Command>,
    request_timeout: Option<Duration>,
}

impl Server {
    /// Binds the socket and starts accepting players in the background.
    pub fn host(config: &NetworkConfig, runtime: &Handle) -> Result<Self> {
        let socket = UdpSocket::bind(config.address()).map_err(transport_error)?;
        let address = socket.local_addr().map_err(transport_error)?;
        let current_time = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| GameError::Internal(e.to_string()))?;
        let server_config = ServerConfig {
            current_time,
            max_clients: config.max_clients,
            protocol_id: config.protocol_id,
            public_addresses: vec![address],
            authentication: ServerAuthentication::Unsecure,
        };
        let transport = NetcodeServerTransport::new(server_config, socket).map_err(transport_error)?;
        let server = RenetServer::new(ConnectionConfig::default());

        let roster = Arc::new(Mutex::new(Roster::default()));
        let (commands, command_rx) = unbounded_channel();
        runtime.spawn(pump(server, transport, roster.clone(), command_rx));
        info!("waiting for players to connect to {address}");

        Ok(Server {
            address,
            roster,
            commands,
            request_timeout: config.request_timeout(),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn count_connected(&self) -> usize {
        lock(&self.roster).connections.len()
    }

    pub fn connected_names(&self) -> Vec<String> {
        lock(&self.roster)
            .connections
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    /// Blocks until `headcount` players are connected, calling `progress`
    /// with the current count after every unsuccessful poll.
    pub fn wait_for_players<F>(&self, headcount: usize, poll: Duration, mut progress: F)
    where
        F: FnMut(usize),
    {
        loop {
            let connected = self.count_connected();
            if connected >= headcount {
                return;
            }
            progress(connected);
            thread::sleep(poll);
        }
    }

    /// Sends a `Play` request and blocks until the player answers with an
    /// integer.
    pub fn send_and_await_int(&self, identity: &str, prompt: &str) -> Result<i64> {
        let client_id = self.client_id(identity)?;
        let (reply, response) = mpsc::channel();
        self.send_command(Command::Request {
            client_id,
            message: Message::Play(prompt.to_string()),
            reply,
        })?;
        let text = match self.request_timeout {
            Some(timeout) => response.recv_timeout(timeout).map_err(|e| {
                GameError::Transport(format!("no answer from {identity}: {e}"))
            })?,
            None => response.recv().map_err(|_| {
                GameError::Transport(format!("network stopped while waiting for {identity}"))
            })?,
        }?;
        debug!("{identity} answered {text:?}");
        decode_answer(&text)
    }

    pub fn display(&self, identity: &str, info: &str) -> Result<()> {
        let client_id = self.client_id(identity)?;
        self.send_command(Command::Send {
            client_id,
            message: Message::Display(info.to_string()),
        })
    }

    pub fn broadcast(&self, info: &str) -> Result<()> {
        self.send_to_all(|| Message::Display(info.to_string()))
    }

    /// Tells every player who won. Follow with [`Server::close`].
    pub fn announce(&self, winner: &str) -> Result<()> {
        self.send_to_all(|| Message::End(winner.to_string()))
    }

    /// Flushes what is queued, then disconnects every player and stops the
    /// background task.
    pub fn close(&self) {
        let (done, closed) = mpsc::channel();
        if self.send_command(Command::Close { done }).is_err() {
            return;
        }
        if closed.recv_timeout(LINGER * 4).is_err() {
            warn!("network did not confirm shutdown");
        }
    }

    fn send_to_all<F>(&self, message: F) -> Result<()>
    where
        F: Fn() -> Message,
    {
        let clients: Vec<ClientId> = lock(&self.roster)
            .connections
            .iter()
            .map(|c| c.client_id)
            .collect();
        for client_id in clients {
            self.send_command(Command::Send {
                client_id,
                message: message(),
            })?;
        }
        Ok(())
    }

    fn client_id(&self, identity: &str) -> Result<ClientId> {
        lock(&self.roster)
            .find(identity)
            .ok_or_else(|| GameError::UnknownPlayer(identity.to_string()))
    }

    fn send_command(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| GameError::Transport("network is not running".to_string()))
    }
}

fn lock(roster: &Mutex<Roster>) -> MutexGuard<'_, Roster> {
    // entries are pushed and removed whole, a poisoned roster is still consistent
    roster.lock().unwrap_or_else(PoisonError::into_inner)
}

fn transport_error<E: std::fmt::Display>(e: E) -> GameError {
    GameError::Transport(e.to_string())
}

async fn pump(
    mut server: RenetServer,
    mut transport: NetcodeServerTransport,
    roster: Arc<Mutex<Roster>>,
    mut commands: UnboundedReceiver<Command>,
) {
    let mut interval = time::interval(TICK);
    let mut pending: HashMap<ClientId, Reply> = HashMap::new();
    let mut closing: Option<(Instant, mpsc::Sender<()>)> = None;
    let mut last_updated = Instant::now();

    loop {
        let now = Instant::now();
        let duration = now - last_updated;
        last_updated = now;

        server.update(duration);
        if let Err(e) = transport.update(duration, &mut server) {
            error!("network update failed: {e}");
        }

        while let Some(event) = server.get_event() {
            match event {
                ServerEvent::ClientConnected { client_id } => {
                    let name = lock(&roster).admit(client_id);
                    info!("{name} connected (client {client_id})");
                }
                ServerEvent::ClientDisconnected { client_id, reason } => {
                    if let Some(name) = lock(&roster).remove(client_id) {
                        info!("{name} disconnected: {reason}");
                    }
                    if let Some(reply) = pending.remove(&client_id) {
                        let _ = reply.send(Err(GameError::Transport(format!(
                            "connection lost: {reason}"
                        ))));
                    }
                }
            }
        }

        for client_id in server.clients_id() {
            while let Some(message) =
                server.receive_message(client_id, DefaultChannel::ReliableOrdered)
            {
                let text = String::from_utf8_lossy(&message).into_owned();
                match pending.remove(&client_id) {
                    Some(reply) => {
                        let _ = reply.send(Ok(text));
                    }
                    None => warn!("ignoring unsolicited message from client {client_id}: {text:?}"),
                }
            }
        }

        transport.send_packets(&mut server);

        if matches!(&closing, Some((deadline, _)) if Instant::now() >= *deadline) {
            transport.disconnect_all(&mut server);
            lock(&roster).connections.clear();
            if let Some((_, done)) = closing.take() {
                let _ = done.send(());
            }
            info!("all connections closed");
            return;
        }

        tokio::select! {
            _ = interval.tick() => {}
            command = commands.recv(), if closing.is_none() => match command {
                Some(Command::Send { client_id, message }) => {
                    send(&mut server, client_id, &message);
                }
                Some(Command::Request { client_id, message, reply }) => {
                    if send(&mut server, client_id, &message) {
                        pending.insert(client_id, reply);
                    } else {
                        let _ = reply.send(Err(GameError::Transport(format!(
                            "client {client_id} is not connected"
                        ))));
                    }
                }
                Some(Command::Close { done }) => {
                    closing = Some((Instant::now() + LINGER, done));
                }
                None => {
                    transport.disconnect_all(&mut server);
                    return;
                }
            }
        }
    }
}

fn send(server: &mut RenetServer, client_id: ClientId, message: &Message) -> bool {
    if !server.clients_id().contains(&client_id) {
        return false;
    }
    debug!("sending {} to client {client_id}", message.verb());
    server.send_message(
        client_id,
        DefaultChannel::ReliableOrdered,
        message.encode().into_bytes(),
    );
    true
}
