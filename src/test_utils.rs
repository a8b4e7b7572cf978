//! Test utilities: canned records and a loopback fake robot
//!
//! The fake robot listens on an ephemeral loopback port and writes a fixed
//! byte script to every client that connects, then holds the socket open until
//! it is dropped. Point a session at it with [`ConsoleConfig::loopback`].
//!
//! [`ConsoleConfig::loopback`]: crate::ConsoleConfig::loopback

#![cfg(any(test, feature = "benchmark"))]

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::Result;
use crate::protocol::encode_record;
use crate::types::{ErrorRecord, LogRecord, PrintRecord};

/// `n` records cycling through print, warning, and error shapes
pub fn sample_records(n: usize) -> Vec<LogRecord> {
    (0..n)
        .map(|i| {
            let seq_number = i as u16;
            let timestamp = i as f32 * 0.02;
            match i % 3 {
                0 => LogRecord::Print(PrintRecord {
                    timestamp,
                    seq_number,
                    line: format!("Periodic tick {i}: pose=(1.25, 3.50)"),
                }),
                flags => LogRecord::Error(ErrorRecord {
                    timestamp,
                    seq_number,
                    occurrence_count: 1,
                    error_code: -(i as i32),
                    flags: (flags - 1) as u8,
                    details: format!("CAN frame {i} timed out"),
                    location: "frc/CANSparkMax.cpp:88".to_string(),
                    call_stack: "at frc.robot.Drivetrain.periodic".to_string(),
                }),
            }
        })
        .collect()
}

/// Wire bytes for `records`, back to back
pub fn encode_stream(records: &[LogRecord]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for record in records {
        bytes.extend(encode_record(record)?);
    }
    Ok(bytes)
}

/// Loopback TCP server standing in for a robot's console port
#[derive(Debug)]
pub struct FakeRobot {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl FakeRobot {
    /// Start serving `script` to every client
    pub async fn start(script: Vec<u8>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepted = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let accepted = Arc::clone(&accepted);
            let cancel = cancel.clone();
            let script: Arc<[u8]> = script.into();
            async move {
                loop {
                    let (mut socket, peer) = tokio::select! {
                        _ = cancel.cancelled() => break,
                        accept = listener.accept() => match accept {
                            Ok(pair) => pair,
                            Err(e) => {
                                debug!("Fake robot accept failed: {}", e);
                                continue;
                            }
                        },
                    };
                    accepted.fetch_add(1, Ordering::SeqCst);
                    debug!("Fake robot accepted {}", peer);

                    let script = Arc::clone(&script);
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if socket.write_all(&script).await.is_err() {
                            return;
                        }
                        cancel.cancelled().await;
                    });
                }
            }
        });

        Ok(Self { addr, accepted, cancel, task })
    }

    /// Serve `records` encoded on the wire
    pub async fn serving(records: &[LogRecord]) -> Result<Self> {
        Ok(Self::start(encode_stream(records)?).await?)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connections accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for FakeRobot {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}
