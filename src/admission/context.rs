//! The narrow call context handed to the admission guard.

use std::net::SocketAddr;

use crate::error::{Result, TurnstileError};

/// Transport channel a call arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// The multiplexed gateway entry point
    Multiplexed,
    /// A plain, directly-routed channel
    Plain,
}

/// Read-only view of an inbound call, carrying exactly what admission needs.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Channel the call arrived on
    pub channel: Channel,
    /// Transport-level peer address, if known
    pub remote_addr: Option<SocketAddr>,
    /// Forwarded client address supplied by an upstream proxy, if any
    pub forwarded_for: Option<String>,
    /// Name of the invoked operation
    pub operation: String,
    /// Name of the operation's enclosing group
    pub group: String,
}

impl CallContext {
    /// Derive the client key used to partition counters.
    ///
    /// Multiplexed calls prefer the forwarded client address (first hop) and
    /// fall back to the transport address; plain-channel calls use the
    /// transport address directly.
    pub fn client_key(&self) -> Result<String> {
        let key = match self.channel {
            Channel::Multiplexed => self
                .forwarded_client()
                .or_else(|| self.remote_addr.map(|addr| addr.ip().to_string())),
            Channel::Plain => self.remote_addr.map(|addr| addr.ip().to_string()),
        };

        key.ok_or_else(|| {
            TurnstileError::Call(format!(
                "no client key derivable for operation '{}'",
                self.operation
            ))
        })
    }

    fn forwarded_client(&self) -> Option<String> {
        let forwarded = self.forwarded_for.as_deref()?;
        let first_hop = forwarded.split(',').next().unwrap_or(forwarded).trim();
        if first_hop.is_empty() {
            None
        } else {
            Some(first_hop.to_string())
        }
    }
}
