//! UDP transport for setpoint packets.
//!
//! Fire-and-forget: every sample is one datagram, nothing is acknowledged,
//! and a failed send is counted and dropped.  The socket carries a write
//! timeout so a wedged network stack cannot stall the transmission thread.

use std::io;
use std::net::{ToSocketAddrs, UdpSocket};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pilot_core::{ControlSample, ControlSink, SinkError};

use crate::packet::{InputPacket, DEFAULT_CLIENT_NAME};
use crate::{LinkError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// `host:port` of the ground client's input socket.
    pub target:           String,
    pub write_timeout_ms: u64,
    pub client_name:      String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            target:           "127.0.0.1:1212".to_string(),
            write_timeout_ms: 5,
            client_name:      DEFAULT_CLIENT_NAME.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct UdpSink {
    cfg:      LinkConfig,
    socket:   Option<UdpSocket>,
    sent:     u64,
    failures: u64,
}

impl UdpSink {
    pub fn new(cfg: LinkConfig) -> Self {
        UdpSink { cfg, socket: None, sent: 0, failures: 0 }
    }

    /// Bind an ephemeral local port and connect it to the target.
    pub fn open(&mut self) -> Result<()> {
        let target = self.cfg.target
            .to_socket_addrs()
            .map_err(|_| LinkError::Address(self.cfg.target.clone()))?
            .next()
            .ok_or_else(|| LinkError::Address(self.cfg.target.clone()))?;

        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;
        socket.connect(target)?;
        socket.set_write_timeout(Some(Duration::from_millis(self.cfg.write_timeout_ms.max(1))))?;

        tracing::info!(%target, "setpoint link open");
        self.socket = Some(socket);
        Ok(())
    }

    pub fn config(&self) -> &LinkConfig { &self.cfg }

    /// Datagrams handed to the OS.
    pub fn sent(&self) -> u64 { self.sent }

    /// Samples dropped (not connected, encode or send error).
    pub fn failures(&self) -> u64 { self.failures }

    fn record_failure(&mut self, why: &dyn std::fmt::Display) {
        self.failures += 1;
        // First failure and then a periodic reminder; at 100 Hz anything
        // more would flood the log.
        if self.failures == 1 || self.failures % 500 == 0 {
            tracing::debug!(failures = self.failures, "setpoint dropped: {why}");
        }
    }
}

impl ControlSink for UdpSink {
    fn send(&mut self, sample: &ControlSample) {
        let bytes = match InputPacket::with_client(sample, &self.cfg.client_name).to_bytes() {
            Ok(b)  => b,
            Err(e) => return self.record_failure(&e),
        };
        let outcome = match self.socket.as_ref() {
            Some(sock) => sock.send(&bytes).map_err(LinkError::from),
            None       => Err(LinkError::Io(io::ErrorKind::NotConnected.into())),
        };
        match outcome {
            Ok(_)  => self.sent += 1,
            Err(e) => self.record_failure(&e),
        }
    }

    fn is_connected(&self) -> bool { self.socket.is_some() }

    fn connect(&mut self) -> std::result::Result<(), SinkError> {
        if self.socket.is_some() {
            return Ok(());
        }
        self.open().map_err(SinkError::from)
    }

    fn disconnect(&mut self) {
        if self.socket.take().is_some() {
            tracing::info!(target = %self.cfg.target, sent = self.sent, failures = self.failures, "setpoint link closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn receiver() -> (UdpSocket, String) {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let addr = rx.local_addr().unwrap().to_string();
        (rx, addr)
    }

    #[test]
    fn delivers_json_datagram() {
        let (rx, addr) = receiver();
        let mut sink = UdpSink::new(LinkConfig { target: addr, ..LinkConfig::default() });
        sink.connect().unwrap();
        assert!(sink.is_connected());

        sink.send(&ControlSample { thrust: 120.0, roll: -4.0, estop: true, ..ControlSample::default() });

        let mut buf = [0u8; 1024];
        let n = rx.recv(&mut buf).unwrap();
        let v: Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(v["ctrl"]["thrust"], 100.0);
        assert_eq!(v["ctrl"]["roll"], -4.0);
        assert_eq!(v["ctrl"]["estop"], true);
        assert_eq!(sink.sent(), 1);
    }

    #[test]
    fn send_while_disconnected_is_counted_not_fatal() {
        let mut sink = UdpSink::new(LinkConfig::default());
        sink.send(&ControlSample::default());
        sink.send(&ControlSample::default());
        assert_eq!(sink.failures(), 2);
        assert_eq!(sink.sent(), 0);
    }

    #[test]
    fn bad_target_is_an_address_error() {
        let mut sink = UdpSink::new(LinkConfig { target: "not an address".to_string(), ..LinkConfig::default() });
        assert!(matches!(sink.open(), Err(LinkError::Address(_))));
        assert!(!sink.is_connected());
    }

    #[test]
    fn disconnect_then_reconnect() {
        let (_rx, addr) = receiver();
        let mut sink = UdpSink::new(LinkConfig { target: addr, ..LinkConfig::default() });
        sink.connect().unwrap();
        sink.disconnect();
        assert!(!sink.is_connected());
        sink.connect().unwrap();
        assert!(sink.is_connected());
    }
}
