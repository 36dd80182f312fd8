// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! In-process RouterOS device for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use routeros_hotspot::{
    LoginMethod, RouterConfig, Sentence, SentenceDecoder, encode_sentence, encode_word,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const CHALLENGE: &str = "0123456789abcdef0123456789abcdef";

/// Login flavour the mock device speaks
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum DeviceLogin {
    /// Pre-6.43: empty `/login` returns an MD5 challenge
    Challenge,
    /// 6.43+: empty `/login` returns a bare `!done`
    Plain,
}

/// Reply sentences for one request, without the tag
pub type Replies = Vec<Vec<String>>;

type Handler = Arc<dyn Fn(&Sentence) -> Replies + Send + Sync>;

pub struct MockDevice {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Sentence>>>,
    connections: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockDevice {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&Sentence) -> Replies + Send + Sync + 'static,
    {
        Self::start_with(DeviceLogin::Challenge, handler).await
    }

    pub async fn start_with<F>(login: DeviceLogin, handler: F) -> Self
    where
        F: Fn(&Sentence) -> Replies + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let handler: Handler = Arc::new(handler);

        {
            let received = received.clone();
            let connections = connections.clone();
            let closed = closed.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(
                        stream,
                        login,
                        handler.clone(),
                        received.clone(),
                        closed.clone(),
                    ));
                }
            });
        }

        Self {
            addr,
            received,
            connections,
            closed,
        }
    }

    pub fn config(&self) -> RouterConfig {
        let mut config = RouterConfig::new(self.addr.ip().to_string(), USERNAME, PASSWORD);
        config.port = self.addr.port();
        config.timeout_secs = 1;
        config
    }

    pub fn config_with(&self, password: &str, login_method: LoginMethod) -> RouterConfig {
        let mut config = self.config();
        config.password = password.to_string();
        config.login_method = login_method;
        config
    }

    /// Every sentence received so far, logins included
    pub fn received(&self) -> Vec<Sentence> {
        self.received.lock().unwrap().clone()
    }

    /// Received sentences whose command word is `path`
    pub fn received_for(&self, path: &str) -> Vec<Sentence> {
        self.received()
            .into_iter()
            .filter(|s| s.words.first().map(String::as_str) == Some(path))
            .collect()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Connections on which the client side reached EOF
    pub fn closed_connections(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Waits up to two seconds for `n` client-side closes
    pub async fn wait_for_closed(&self, n: usize) -> usize {
        for _ in 0..100 {
            if self.closed_connections() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.closed_connections()
    }
}

pub fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

pub fn done() -> Replies {
    vec![words(&["!done"])]
}

pub fn trap(message: &str) -> Replies {
    vec![
        vec!["!trap".to_string(), format!("=message={message}")],
        words(&["!done"]),
    ]
}

pub fn has_word(sentence: &Sentence, word: &str) -> bool {
    sentence.words.iter().any(|w| w == word)
}

fn expected_response() -> String {
    let challenge = hex::decode(CHALLENGE).unwrap();
    let mut data = vec![0u8];
    data.extend_from_slice(PASSWORD.as_bytes());
    data.extend_from_slice(&challenge);
    format!("00{}", hex::encode(md5::compute(&data).0))
}

fn login_replies(login: DeviceLogin, sentence: &Sentence) -> Replies {
    let attrs = &sentence.attributes;
    let name_ok = attrs.get("name").map(String::as_str) == Some(USERNAME);
    if let Some(response) = attrs.get("response") {
        if login == DeviceLogin::Challenge && name_ok && *response == expected_response() {
            return done();
        }
        return trap("invalid user name or password (6)");
    }
    if let Some(password) = attrs.get("password") {
        if login == DeviceLogin::Plain && name_ok && password == PASSWORD {
            return done();
        }
        return trap("invalid user name or password (6)");
    }
    match login {
        DeviceLogin::Challenge => vec![vec!["!done".to_string(), format!("=ret={CHALLENGE}")]],
        DeviceLogin::Plain => done(),
    }
}

async fn serve(
    mut stream: TcpStream,
    login: DeviceLogin,
    handler: Handler,
    received: Arc<Mutex<Vec<Sentence>>>,
    closed: Arc<AtomicUsize>,
) {
    let mut decoder = SentenceDecoder::new();
    let mut buf = [0u8; 1024];
    let mut quitting = false;
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => {
                closed.fetch_add(1, Ordering::SeqCst);
                return;
            }
            Ok(n) => n,
        };
        if quitting {
            continue;
        }
        decoder.extend(&buf[..n]);
        while let Some(sentence) = decoder.next_sentence().unwrap() {
            received.lock().unwrap().push(sentence.clone());
            let tag = sentence.tag.unwrap_or(0);
            let command = sentence.words.first().cloned().unwrap_or_default();

            if command == "/quit" {
                let mut out = encode_word("!fatal").unwrap();
                out.extend(encode_word("session terminated on request").unwrap());
                out.push(0);
                let _ = stream.write_all(&out).await;
                // drain until the client drops its side
                let _ = stream.shutdown().await;
                quitting = true;
                break;
            }

            let replies = if command == "/login" {
                login_replies(login, &sentence)
            } else {
                handler(&sentence)
            };
            let mut out = Vec::new();
            let mut close_after = false;
            for reply in replies {
                close_after |= reply.first().map(String::as_str) == Some("!fatal");
                out.extend(encode_sentence(reply.as_slice(), tag).unwrap());
            }
            if stream.write_all(&out).await.is_err() || close_after {
                return;
            }
        }
    }
}
