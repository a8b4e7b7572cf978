//! Robot connection discovery
//!
//! A robot can be reachable in several ways depending on how the laptop is
//! attached: over USB, by mDNS name on the robot radio, by its static
//! `10.TE.AM.2` address, or wherever the local driver station says it is.
//! [`RobotConnector`] tries all of them at once and keeps the first socket that
//! completes a handshake.

pub mod discovery;
pub mod race;

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::{ConsoleConfig, TEAM_PLACEHOLDER};
use crate::{Result, RioLogError};

/// Source of console byte streams for a session
///
/// The reconnect loop calls [`Connector::connect`] once per cycle. Returning
/// `None` is the normal "robot not reachable right now" outcome, not an error.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Stream type produced by a successful connection
    type Stream: AsyncRead + Unpin + Send + 'static;

    /// Make one bounded attempt to reach the robot for `team_number`
    async fn connect(&self, team_number: u32) -> Option<Self::Stream>;
}

/// One way of reaching the robot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Literal address or hostname
    Host(String),

    /// Address reported by the driver station on a local port
    DriverStation { discovery_port: u16 },
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Host(host) => f.write_str(host),
            Candidate::DriverStation { discovery_port } => {
                write!(f, "driver station (port {})", discovery_port)
            }
        }
    }
}

/// Static radio address for a team, `None` when the team number has no such address
pub fn static_address(team_number: u32) -> Option<Ipv4Addr> {
    let high = u8::try_from(team_number / 100).ok()?;
    let low = (team_number % 100) as u8;
    Some(Ipv4Addr::new(10, high, low, 2))
}

/// Every candidate the configuration enables for `team_number`
pub fn candidates(config: &ConsoleConfig, team_number: u32) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = config.fixed_hosts.iter().cloned().map(Candidate::Host).collect();

    let team = team_number.to_string();
    out.extend(
        config
            .host_templates
            .iter()
            .map(|template| Candidate::Host(template.replace(TEAM_PLACEHOLDER, &team))),
    );

    if config.static_ip {
        match static_address(team_number) {
            Some(addr) => out.push(Candidate::Host(addr.to_string())),
            None => debug!(team_number, "Team number has no static address"),
        }
    }

    if config.discovery {
        out.push(Candidate::DriverStation { discovery_port: config.discovery_port });
    }

    out
}

/// Races every configured candidate for the robot's console port
#[derive(Debug, Clone)]
pub struct RobotConnector {
    config: Arc<ConsoleConfig>,
}

impl RobotConnector {
    pub fn new(config: Arc<ConsoleConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    fn attempt(candidate: Candidate, port: u16) -> BoxFuture<'static, Result<TcpStream>> {
        async move {
            let stream = match &candidate {
                Candidate::Host(host) => TcpStream::connect((host.as_str(), port)).await,
                Candidate::DriverStation { discovery_port } => {
                    let addr = discovery::query_driver_station(*discovery_port).await?;
                    TcpStream::connect((addr, port)).await
                }
            };
            stream.map_err(|e| {
                RioLogError::connection_failed_with_source(
                    format!("{} port {}", candidate, port),
                    Box::new(e),
                )
            })
        }
        .boxed()
    }

    fn tune(&self, stream: &TcpStream) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let keepalive = self.config.keepalive();
        if keepalive > Duration::ZERO {
            let params = socket2::TcpKeepalive::new().with_time(keepalive);
            if let Err(e) = socket2::SockRef::from(stream).set_tcp_keepalive(&params) {
                warn!("Failed to enable TCP keep-alive: {}", e);
            }
        }
    }
}

#[async_trait::async_trait]
impl Connector for RobotConnector {
    type Stream = TcpStream;

    async fn connect(&self, team_number: u32) -> Option<TcpStream> {
        let candidates = candidates(&self.config, team_number);
        debug!(team_number, count = candidates.len(), "Racing connection candidates");

        let attempts: Vec<_> =
            candidates.iter().cloned().map(|c| Self::attempt(c, self.config.port)).collect();

        let (index, stream) = match race::race(attempts, self.config.connect_timeout()).await {
            Ok(won) => won,
            Err(e) => {
                debug!(team_number, "No robot console reachable: {}", e);
                return None;
            }
        };
        info!(candidate = %candidates[index], port = self.config.port, "Connected to robot console");

        self.tune(&stream);
        Some(stream)
    }
}
