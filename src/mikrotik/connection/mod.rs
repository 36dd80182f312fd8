// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Low-level RouterOS API connection handling
//!
//! The socket is split in two. Writes go through [`RouterOsConnection::request`],
//! which tags every sentence and parks a oneshot sender in the pending table.
//! A background read loop feeds received bytes into a [`SentenceDecoder`] and
//! routes each complete sentence to the waiter holding its tag.

mod auth;
mod protocol;
mod sentence;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};

use crate::error::{ClientError, Result};

pub use protocol::{MAX_WORD_LEN, decode_length, decode_word, encode_length, encode_word};
pub use sentence::{
    Attributes, ReplyKind, Sentence, SentenceDecoder, decode_sentence, encode_sentence,
};

/// Size of a single socket read
const READ_CHUNK: usize = 4096;

/// Upper bound for the best-effort `/quit` write
const QUIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Data rows and `!done` attributes of a completed command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub rows: Vec<Attributes>,
    pub done: Attributes,
}

struct PendingReply {
    rows: Vec<Attributes>,
    tx: oneshot::Sender<Result<Reply>>,
}

type PendingTable = Arc<Mutex<HashMap<u64, PendingReply>>>;

/// Why the read loop stopped
enum Shutdown {
    Closed(String),
    Protocol(String),
}

impl Shutdown {
    fn to_error(&self) -> ClientError {
        match self {
            Self::Closed(reason) => ClientError::Connection(reason.clone()),
            Self::Protocol(reason) => ClientError::Protocol(reason.clone()),
        }
    }
}

/// Low-level RouterOS API connection
pub(crate) struct RouterOsConnection {
    writer: Mutex<OwnedWriteHalf>,
    pending: PendingTable,
    next_tag: AtomicU64,
    closed: Arc<AtomicBool>,
    request_timeout: Duration,
    reader: JoinHandle<()>,
}

impl RouterOsConnection {
    pub(crate) async fn connect(addr: &str, request_timeout: Duration) -> Result<Self> {
        tracing::trace!("Attempting TCP connection to: {}", addr);
        let stream = match timeout(request_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ClientError::Connection(format!("{addr}: {e}")));
            }
            Err(_) => {
                return Err(ClientError::Connection(format!(
                    "{addr}: connect timed out after {request_timeout:?}"
                )));
            }
        };
        tracing::trace!("TCP connection established to: {}", addr);
        Ok(Self::from_stream(stream, request_timeout))
    }

    fn from_stream(stream: TcpStream, request_timeout: Duration) -> Self {
        let (read_half, write_half) = stream.into_split();
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_loop(read_half, pending.clone(), closed.clone()));
        Self {
            writer: Mutex::new(write_half),
            pending,
            next_tag: AtomicU64::new(1),
            closed,
            request_timeout,
            reader,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) async fn command<S: AsRef<str>>(&self, path: &str, args: &[S]) -> Result<Reply> {
        let mut words: Vec<&str> = Vec::with_capacity(1 + args.len());
        words.push(path);
        words.extend(args.iter().map(|a| a.as_ref()));
        self.request(&words).await
    }

    /// Sends one tagged sentence and waits for its `!done` or `!trap`
    pub(crate) async fn request<S: AsRef<str>>(&self, words: &[S]) -> Result<Reply> {
        if self.is_closed() {
            return Err(ClientError::Connection("connection closed".to_string()));
        }
        let tag = self.next_tag.fetch_add(1, Ordering::SeqCst);
        let bytes = encode_sentence(words, tag)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(
            tag,
            PendingReply {
                rows: Vec::new(),
                tx,
            },
        );
        // the read loop may have drained the table just before our insert
        if self.is_closed() {
            self.pending.lock().await.remove(&tag);
            return Err(ClientError::Connection("connection closed".to_string()));
        }

        tracing::trace!(
            "Sending {} (tag {})",
            words.first().map_or("", |w| w.as_ref()),
            tag
        );
        // one deadline covers both the write and the wait for the reply
        let deadline = Instant::now() + self.request_timeout;
        match timeout_at(deadline, self.write_all(&bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.pending.lock().await.remove(&tag);
                return Err(e);
            }
            Err(_) => {
                // a partially written sentence leaves the stream unusable
                tracing::warn!(
                    "Write for tag {} not drained within {:?}, dropping connection",
                    tag,
                    self.request_timeout
                );
                self.abandon(Shutdown::Closed("write timed out".to_string()))
                    .await;
                return Err(ClientError::Timeout { tag });
            }
        }

        match timeout_at(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::Connection(
                "connection closed while waiting for reply".to_string(),
            )),
            Err(_) => {
                // a late reply for this tag finds no listener and is discarded
                self.pending.lock().await.remove(&tag);
                tracing::warn!(
                    "No reply for tag {} within {:?}",
                    tag,
                    self.request_timeout
                );
                Err(ClientError::Timeout { tag })
            }
        }
    }

    async fn write_all(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Best-effort `/quit`, then tears the socket down regardless
    pub(crate) async fn close(&self) {
        if !self.is_closed() {
            let tag = self.next_tag.fetch_add(1, Ordering::SeqCst);
            match encode_sentence(&["/quit"], tag) {
                Ok(bytes) => {
                    if timeout(QUIT_TIMEOUT, self.write_all(&bytes)).await.is_err() {
                        tracing::debug!("Timed out sending /quit");
                    }
                }
                Err(e) => tracing::debug!("Could not encode /quit: {}", e),
            }
        }
        // a writer stuck on a full send buffer must not block the close
        match timeout(QUIT_TIMEOUT, self.writer.lock()).await {
            Ok(mut writer) => {
                if timeout(QUIT_TIMEOUT, writer.shutdown()).await.is_err() {
                    tracing::debug!("Timed out shutting down the socket");
                }
            }
            Err(_) => tracing::debug!("Writer busy, skipping graceful shutdown"),
        }
        self.abandon(Shutdown::Closed("connection closed by client".to_string()))
            .await;
    }

    /// Stops the read loop and fails every waiter
    async fn abandon(&self, shutdown: Shutdown) {
        self.reader.abort();
        self.closed.store(true, Ordering::SeqCst);
        fail_pending(&self.pending, &shutdown).await;
    }

    #[cfg(test)]
    pub(crate) async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Drop for RouterOsConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(mut reader: OwnedReadHalf, pending: PendingTable, closed: Arc<AtomicBool>) {
    let mut decoder = SentenceDecoder::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let shutdown = loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break Shutdown::Closed("connection closed by peer".to_string()),
            Ok(n) => {
                decoder.extend(&chunk[..n]);
                if let Some(shutdown) = dispatch_buffered(&mut decoder, &pending).await {
                    break shutdown;
                }
            }
            Err(e) => break Shutdown::Closed(format!("read error: {e}")),
        }
    };
    closed.store(true, Ordering::SeqCst);
    match &shutdown {
        Shutdown::Closed(reason) => tracing::debug!("RouterOS connection ended: {}", reason),
        Shutdown::Protocol(reason) => tracing::error!("RouterOS protocol error: {}", reason),
    }
    fail_pending(&pending, &shutdown).await;
}

/// Routes every complete buffered sentence to its waiter
async fn dispatch_buffered(
    decoder: &mut SentenceDecoder,
    pending: &PendingTable,
) -> Option<Shutdown> {
    loop {
        let sentence = match decoder.next_sentence() {
            Ok(Some(sentence)) => sentence,
            Ok(None) => return None,
            Err(e) => return Some(Shutdown::Protocol(e.to_string())),
        };
        if sentence.kind == ReplyKind::Fatal {
            return Some(Shutdown::Closed(format!(
                "!fatal: {}",
                sentence.error_message()
            )));
        }
        let Some(tag) = sentence.tag else {
            tracing::trace!("Dropping untagged sentence: {:?}", sentence.words);
            continue;
        };

        let mut table = pending.lock().await;
        match sentence.kind {
            ReplyKind::Row => match table.get_mut(&tag) {
                Some(waiter) => waiter.rows.push(sentence.attributes),
                None => tracing::trace!("Discarding row for unknown tag {}", tag),
            },
            ReplyKind::Done => match table.remove(&tag) {
                Some(waiter) => {
                    tracing::trace!("Tag {} done, {} rows", tag, waiter.rows.len());
                    let _ = waiter.tx.send(Ok(Reply {
                        rows: waiter.rows,
                        done: sentence.attributes,
                    }));
                }
                None => tracing::trace!("Discarding !done for unknown tag {}", tag),
            },
            ReplyKind::Trap => {
                let message = sentence.error_message();
                match table.remove(&tag) {
                    Some(waiter) => {
                        tracing::trace!("Tag {} trapped: {}", tag, message);
                        let _ = waiter.tx.send(Err(ClientError::Trap { message }));
                    }
                    None => tracing::trace!("Discarding !trap for unknown tag {}", tag),
                }
            }
            ReplyKind::Fatal => {}
        }
    }
}

async fn fail_pending(pending: &PendingTable, shutdown: &Shutdown) {
    let mut table = pending.lock().await;
    for (_, waiter) in table.drain() {
        let _ = waiter.tx.send(Err(shutdown.to_error()));
    }
}
