//! Line-oriented TCP surface for viewers and controllers.
//!
//! Clients connect, optionally send control commands one per line, and
//! receive the status line the coordinator publishes. The protocol is
//! plain text so `nc` works as a viewer.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use anyhow::Context;
use crossfire::MRx;
use prairie_core::{ControlCommand, StatusSnapshot};
use prairie_runtime::{CommandSender, submit_command};
use tracing::{debug, info, warn};

type Clients = Arc<Mutex<Vec<TcpStream>>>;

/// Bind the viewer server and start its accept and broadcast threads.
/// Returns the bound address (useful when binding port 0).
///
/// The threads are detached: the broadcast thread exits when the status
/// channel closes, the accept thread lives for the rest of the process.
pub fn start_viewer(
    addr: SocketAddr,
    commands: CommandSender,
    status_rx: MRx<StatusSnapshot>,
) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind(addr).with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr().context("failed to read bound address")?;
    info!(%local_addr, "viewer server listening");

    let clients: Clients = Arc::new(Mutex::new(Vec::new()));

    thread::Builder::new()
        .name("viewer-accept".into())
        .spawn({
            let clients = clients.clone();
            move || accept_loop(&listener, &clients, &commands)
        })
        .context("failed to spawn viewer accept thread")?;

    thread::Builder::new()
        .name("viewer-broadcast".into())
        .spawn(move || broadcast_loop(&status_rx, &clients))
        .context("failed to spawn viewer broadcast thread")?;

    Ok(local_addr)
}

fn accept_loop(listener: &TcpListener, clients: &Clients, commands: &CommandSender) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "viewer accept failed");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map_or_else(|_| "<unknown>".to_string(), |addr| addr.to_string());
        info!(peer = %peer, "viewer connected");

        match stream.try_clone() {
            Ok(writer) => clients
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(writer),
            Err(err) => {
                warn!(peer = %peer, error = %err, "failed to clone viewer stream");
                continue;
            }
        }

        let commands = commands.clone();
        let spawned = thread::Builder::new()
            .name(format!("viewer-{peer}"))
            .spawn(move || read_commands(stream, &commands, &peer));
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn viewer reader thread");
        }
    }
}

/// Parse each inbound line as a control command and forward it to the
/// coordinator. Malformed lines are logged and ignored.
fn read_commands(stream: TcpStream, commands: &CommandSender, peer: &str) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                debug!(peer, error = %err, "viewer read ended");
                break;
            }
        };
        match ControlCommand::parse(&line) {
            Ok(command) => {
                debug!(peer, ?command, "control command received");
                submit_command(commands, command);
            }
            Err(err) => warn!(peer, line = %line, error = %err, "ignoring malformed command"),
        }
    }
    info!(peer, "viewer disconnected");
}

/// Fan each status snapshot out to every connected client, dropping
/// clients whose socket has gone away.
fn broadcast_loop(status_rx: &MRx<StatusSnapshot>, clients: &Clients) {
    while let Ok(snapshot) = status_rx.recv() {
        let line = format!("{snapshot}\n");
        clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain_mut(|client| match client.write_all(line.as_bytes()) {
                Ok(()) => true,
                Err(err) => {
                    debug!(error = %err, "dropping viewer client");
                    false
                }
            });
    }
    debug!("status channel closed; broadcast thread exiting");
}
