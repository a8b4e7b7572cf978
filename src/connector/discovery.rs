//! Driver-station address discovery
//!
//! The driver station listens on a local port and pushes a single JSON object
//! describing the robot it is talking to:
//!
//! ```json
//! {"robotIP": 167772418}
//! ```
//!
//! `robotIP` is the IPv4 address as a big-endian `u32`; `0` means the driver
//! station has no robot.

use std::net::Ipv4Addr;

use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::{Result, RioLogError};

/// Driver-station reports are a few dozen bytes; anything larger is not one
const MAX_REPORT_LEN: usize = 4096;

#[derive(Debug, Deserialize)]
struct DriverStationReport {
    #[serde(rename = "robotIP")]
    robot_ip: u32,
}

/// Parse a driver-station report into the robot's address
///
/// Returns `Ok(None)` while the report is still incomplete JSON.
pub fn parse_report(bytes: &[u8]) -> Result<Option<Ipv4Addr>> {
    match serde_json::from_slice::<DriverStationReport>(bytes) {
        Ok(report) if report.robot_ip == 0 => {
            Err(RioLogError::connection_failed("driver station reports no robot"))
        }
        Ok(report) => Ok(Some(Ipv4Addr::from(report.robot_ip))),
        Err(e) if e.is_eof() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Ask the driver station on `discovery_port` for the robot address
pub async fn query_driver_station(discovery_port: u16) -> Result<Ipv4Addr> {
    let mut socket = TcpStream::connect((Ipv4Addr::LOCALHOST, discovery_port))
        .await
        .map_err(|e| {
            RioLogError::connection_failed_with_source("driver station unavailable", Box::new(e))
        })?;

    let mut report = Vec::with_capacity(128);
    let mut chunk = [0u8; 512];
    loop {
        let read = socket.read(&mut chunk).await?;
        if read == 0 {
            return Err(RioLogError::connection_failed("driver station closed before reporting"));
        }
        report.extend_from_slice(&chunk[..read]);
        trace!(bytes = report.len(), "Driver station report chunk");

        if let Some(addr) = parse_report(&report)? {
            debug!(%addr, "Driver station reports robot address");
            return Ok(addr);
        }
        if report.len() > MAX_REPORT_LEN {
            return Err(RioLogError::connection_failed("driver station report too large"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn report_decodes_to_dotted_quad() {
        let addr = parse_report(br#"{"robotIP": 167772418}"#).unwrap();
        assert_eq!(addr, Some(Ipv4Addr::new(10, 0, 1, 2)));
    }

    #[test]
    fn zero_address_means_no_robot() {
        let err = parse_report(br#"{"robotIP":0}"#).unwrap_err();
        assert!(matches!(err, RioLogError::Connection { .. }));
    }

    #[test]
    fn incomplete_report_waits_for_more() {
        assert_eq!(parse_report(br#"{"robotIP": 1677"#).unwrap(), None);
        assert!(parse_report(b"not json").is_err());
    }

    #[tokio::test]
    async fn queries_local_driver_station() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(br#"{"robot"#).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            socket.write_all(br#"IP": 2886860802}"#).await.unwrap();
        });

        let addr = query_driver_station(port).await.unwrap();
        assert_eq!(addr, Ipv4Addr::new(172, 18, 0, 2));
    }

    #[tokio::test]
    async fn closed_driver_station_fails() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        assert!(query_driver_station(port).await.is_err());
    }
}
