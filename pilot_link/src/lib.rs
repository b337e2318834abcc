//! # pilot_link
//!
//! Encodes [`ControlSample`](pilot_core::ControlSample)s as the JSON input-device packets understood by
//! the quadcopter ground client, and delivers them over UDP.
//!
//! ```json
//! {"version":1,"client_name":"ZMQ Client",
//!  "ctrl":{"roll":0.0,"pitch":0.0,"yaw":0.0,"thrust":42.0,"estop":false,"alt1":false,"alt2":false}}
//! ```
//!
//! Thrust is clamped to `[0, 100]` here; the mapping engine upstream is
//! allowed to produce raw values outside that range.
//!
//! ## Transport
//!
//! Packets go out as plain UDP datagrams, one per sample.  The default
//! target `127.0.0.1:1212` and client name `"ZMQ Client"` match the ground
//! client's input socket, but that socket speaks ZeroMQ: a stock client will
//! not accept these datagrams.  Point `LinkConfig::target` at a UDP-to-ZeroMQ
//! relay, or at a receiver that reads the JSON datagrams directly.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pilot_link::{LinkConfig, UdpSink};
//! use pilot_core::{shared_sink, PilotConfig, PilotContext, ScreenProjector};
//!
//! let sink = UdpSink::new(LinkConfig::default());
//! let mut ctx = PilotContext::new(shared_sink(sink), ScreenProjector::identity(), &PilotConfig::default());
//! ctx.start_link();
//! ```

pub mod packet;
pub mod udp;

use thiserror::Error;

pub use packet::{ControlPacket, InputPacket, PACKET_VERSION};
pub use udp::{LinkConfig, UdpSink};

use pilot_core::SinkError;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid target address {0:?}")]
    Address(String),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LinkError> for SinkError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::Io(io) => SinkError::Io(io),
            other             => SinkError::Encode(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
