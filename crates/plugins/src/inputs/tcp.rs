//! TCP input - line-delimited listener
//!
//! Accepts TCP connections and feeds each newline-delimited frame to
//! the attached parser. One task per connection; the peer address is
//! recorded as a `sender` label on every produced event.
//!
//! A parser sub-plugin is required:
//!
//! ```toml
//! [inputs.tcp]
//! address = "0.0.0.0:9001"
//!
//! [inputs.tcp.parser.json]
//! ```
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `address` | string | required | Listen address, `host:port` |
//! | `routing_key` | string | `"tcp"` | Routing key passed to the parser |
//! | `max_frame_size` | int | `1048576` | Per-line size cap in bytes; an oversized frame closes its connection |

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use neptunus_core::decode::decode;
use neptunus_core::{CancellationToken, EventTx, Input, Parser, PluginError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct TcpConfig {
    address: String,
    routing_key: String,
    max_frame_size: usize,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            routing_key: "tcp".to_owned(),
            max_frame_size: 1024 * 1024,
        }
    }
}

/// Line-delimited TCP listener
#[derive(Default)]
pub struct Tcp {
    alias: String,
    pipeline: String,
    config: TcpConfig,
    parser: Option<Arc<dyn Parser>>,
    stop: Option<CancellationToken>,
    out: Option<EventTx>,
}

#[async_trait]
impl Input for Tcp {
    fn init(
        &mut self,
        conf: &toml::Table,
        alias: &str,
        pipeline: &str,
    ) -> Result<(), PluginError> {
        self.config = decode(conf)?;
        self.alias = alias.to_owned();
        self.pipeline = pipeline.to_owned();

        if self.config.address.is_empty() {
            return Err(PluginError::config("address required"));
        }
        Ok(())
    }

    fn set_channels(&mut self, stop: CancellationToken, out: EventTx) {
        self.stop = Some(stop);
        self.out = Some(out);
    }

    fn set_parser(&mut self, parser: Box<dyn Parser>) -> Result<(), PluginError> {
        self.parser = Some(Arc::from(parser));
        Ok(())
    }

    async fn run(&mut self) {
        let (Some(stop), Some(out)) = (self.stop.take(), self.out.take()) else {
            error!(
                pipeline = %self.pipeline,
                input = %self.alias,
                "tcp input started without channels"
            );
            return;
        };
        let Some(parser) = self.parser.take() else {
            error!(
                pipeline = %self.pipeline,
                input = %self.alias,
                "tcp input requires a parser, none attached"
            );
            return;
        };

        let listener = match TcpListener::bind(&self.config.address).await {
            Ok(listener) => listener,
            Err(err) => {
                error!(
                    pipeline = %self.pipeline,
                    input = %self.alias,
                    address = %self.config.address,
                    error = %err,
                    "tcp listener bind failed"
                );
                return;
            }
        };
        info!(
            pipeline = %self.pipeline,
            input = %self.alias,
            address = %self.config.address,
            "tcp input listening"
        );

        let mut connections = Vec::new();
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(
                                pipeline = %self.pipeline,
                                input = %self.alias,
                                peer = %peer,
                                "connection accepted"
                            );
                            let conn = Connection {
                                pipeline: self.pipeline.clone(),
                                alias: self.alias.clone(),
                                routing_key: self.config.routing_key.clone(),
                                max_frame_size: self.config.max_frame_size,
                                parser: Arc::clone(&parser),
                                out: out.clone(),
                                stop: stop.child_token(),
                            };
                            connections.push(tokio::spawn(conn.serve(stream, peer.to_string())));
                        }
                        Err(err) => {
                            warn!(
                                pipeline = %self.pipeline,
                                input = %self.alias,
                                error = %err,
                                "accept failed"
                            );
                        }
                    }
                }
            }
        }

        // connection tasks observe the child tokens and drain
        drop(listener);
        drop(out);
        for conn in connections {
            if let Err(err) = conn.await {
                error!(
                    pipeline = %self.pipeline,
                    input = %self.alias,
                    error = %err,
                    "connection task panicked"
                );
            }
        }

        if let Err(err) = parser.close() {
            warn!(
                pipeline = %self.pipeline,
                input = %self.alias,
                error = %err,
                "parser closed with error"
            );
        }
        info!(pipeline = %self.pipeline, input = %self.alias, "tcp input stopped");
    }
}

struct Connection {
    pipeline: String,
    alias: String,
    routing_key: String,
    max_frame_size: usize,
    parser: Arc<dyn Parser>,
    out: EventTx,
    stop: CancellationToken,
}

impl Connection {
    async fn serve(self, stream: TcpStream, peer: String) {
        // the codec bounds the read itself, so an unterminated line can
        // never grow past the cap in memory
        let mut frames = FramedRead::new(
            stream,
            LinesCodec::new_with_max_length(self.max_frame_size),
        );
        loop {
            let frame = tokio::select! {
                _ = self.stop.cancelled() => break,
                frame = frames.next() => frame,
            };
            match frame {
                None => break,
                Some(Ok(line)) => {
                    let frame = line.trim_end_matches('\r');
                    if frame.trim().is_empty() {
                        continue;
                    }
                    match self.parser.parse(frame.as_bytes(), &self.routing_key) {
                        Ok(events) => {
                            for mut event in events {
                                event.add_label("sender", peer.clone());
                                if self.out.send(event).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(err) => {
                            warn!(
                                pipeline = %self.pipeline,
                                input = %self.alias,
                                peer = %peer,
                                error = %err,
                                "frame parse failed, dropped"
                            );
                        }
                    }
                }
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    // the codec cannot resync mid-line; drop the peer
                    warn!(
                        pipeline = %self.pipeline,
                        input = %self.alias,
                        peer = %peer,
                        cap = self.max_frame_size,
                        "frame exceeds size cap, connection closed"
                    );
                    break;
                }
                Some(Err(LinesCodecError::Io(err))) => {
                    debug!(
                        pipeline = %self.pipeline,
                        input = %self.alias,
                        peer = %peer,
                        error = %err,
                        "connection read failed"
                    );
                    break;
                }
            }
        }
    }
}
