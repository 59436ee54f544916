//! The UDP receive loop, per-datagram worker, and response assembly.
//! Parameterised over an already-bound `UdpSocket` so it can be driven
//! in tests without needing a real, privileged bind to port 53.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use dns_proto::{Message, QueryType, Question, RecordType, ResourceRecord};

use crate::error::Error;
use crate::store::Store;

/// RFC 1035's UDP payload limit. Oversized responses are not
/// truncated; that is an explicit non-goal.
pub const MAX_UDP_PAYLOAD: usize = 512;
pub const DEFAULT_PORT: u16 = 53;

/// Normalise an empty or `"localhost"` bind address to the loopback
/// address; anything else is passed through unchanged.
pub fn normalise_bind_addr(bind: &str) -> &str {
    if bind.is_empty() || bind.eq_ignore_ascii_case("localhost") {
        "127.0.0.1"
    } else {
        bind
    }
}

/// Normalise a non-positive or out-of-range port to the standard DNS
/// port.
pub fn normalise_port(port: i32) -> u16 {
    if port > 0 && port <= i32::from(u16::MAX) {
        port as u16
    } else {
        DEFAULT_PORT
    }
}

/// Bind the UDP socket the dispatcher will serve from, normalising
/// `bind_addr`/`port` first. On bind failure the error is delivered on
/// `fatal` and no server handle is returned, per the startup contract.
pub async fn bind(bind_addr: &str, port: i32, fatal: &mpsc::Sender<Error>) -> Option<UdpSocket> {
    let addr = normalise_bind_addr(bind_addr);
    let port = normalise_port(port);
    tracing::info!(%addr, %port, "binding DNS UDP socket");
    match UdpSocket::bind((addr, port)).await {
        Ok(socket) => Some(socket),
        Err(error) => {
            tracing::error!(?error, "could not bind DNS UDP socket");
            let _ = fatal.send(Error::from(error)).await;
            None
        }
    }
}

/// Classify a question per the spec's ALL / address / other rule and
/// delegate to the matching store operation.
pub async fn answer_question(
    store: &Store,
    question: &Question,
) -> Result<Vec<ResourceRecord>, Error> {
    match question.qtype {
        QueryType::Any => store.find_label(&question.name).await,
        QueryType::Record(rtype @ (RecordType::A | RecordType::AAAA)) => {
            store.find_recursively(&question.name, rtype).await
        }
        QueryType::Record(rtype) => store.find(&question.name, rtype).await.map(|rr| vec![rr]),
    }
}

/// Decode, answer, and reply to a single datagram. Never panics on
/// malformed input: decode failures and serialise failures are logged
/// and simply produce no reply.
async fn serve(store: &Store, socket: &UdpSocket, peer: SocketAddr, bytes: &[u8]) {
    let message = match Message::from_octets(bytes) {
        Ok(message) => message,
        Err(error) => {
            tracing::debug!(?peer, ?error, "dropping undecodable datagram");
            return;
        }
    };

    if message.header.is_response {
        tracing::debug!(?peer, id = %message.header.id, "dropping reply-flagged datagram");
        return;
    }

    let mut response = message.make_response();
    let mut abort: Option<Error> = None;

    for question in &message.questions {
        match answer_question(store, question).await {
            Ok(mut answers) => {
                tracing::info!(
                    %peer,
                    name = %question.name,
                    qtype = ?question.qtype,
                    answers = answers.len(),
                    "answered"
                );
                response.answers.append(&mut answers);
            }
            Err(Error::NotFound) => {
                tracing::debug!(%peer, name = %question.name, qtype = ?question.qtype, "not found");
            }
            Err(error) => {
                tracing::warn!(%peer, name = %question.name, ?error, "aborting response");
                abort = Some(error);
                break;
            }
        }
    }

    if let Some(error) = abort {
        response.answers.clear();
        response.header.rcode = error.rcode();
    }

    match response.to_octets() {
        Ok(octets) => {
            if let Err(error) = socket.send_to(&octets, peer).await {
                tracing::warn!(%peer, ?error, "udp send failed");
            }
        }
        Err(error) => {
            tracing::warn!(%peer, ?error, "could not serialise response");
        }
    }
}

/// Run the receive loop forever: read a datagram, record its source
/// address, and spawn an independent worker to answer it. I/O errors
/// on the read side are fatal and terminate the loop; a zero-length
/// read is logged and does not stop the server.
pub async fn listen(store: Arc<Store>, socket: UdpSocket, fatal: mpsc::Sender<Error>) {
    let socket = Arc::new(socket);
    let mut buf = BytesMut::zeroed(MAX_UDP_PAYLOAD);

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((0, peer)) => {
                tracing::warn!(?peer, "received zero-length datagram");
            }
            Ok((size, peer)) => {
                tracing::debug!(?peer, size, "received datagram");
                let datagram = Bytes::copy_from_slice(&buf[..size]);
                let store = Arc::clone(&store);
                let socket = Arc::clone(&socket);
                tokio::spawn(async move {
                    serve(&store, &socket, peer, &datagram).await;
                });
            }
            Err(error) => {
                tracing::error!(?error, "udp read failed, shutting down");
                let _ = fatal.send(Error::from(error)).await;
                return;
            }
        }
    }
}
