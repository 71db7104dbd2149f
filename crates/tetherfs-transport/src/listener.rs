//! The helper channel's server side: one well-known channel name, one
//! client accepted at a time (§4.5, §6).
//!
//! State machine: `Closed → Listening → (Connected | Listening) → Closed`.
//! Only one concurrent `Connected` is permitted; a second connect attempt
//! while a [`HelperSession`] is alive is rejected with
//! [`TransportError::AlreadyConnected`] rather than queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::platform;
use crate::session::HelperSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Listening,
    Connected,
}

pub struct HelperListener {
    inner: platform::PlatformListener,
    connected: Arc<AtomicBool>,
    closed: bool,
}

impl HelperListener {
    /// Binds the well-known channel name. Access to the underlying
    /// primitive is gated by an ambient administrative-and-system
    /// security descriptor (§6); that descriptor is supplied by the
    /// platform backend, not by this layer.
    pub fn bind(name: &str) -> Result<Self> {
        let inner = platform::PlatformListener::bind(name)?;
        Ok(HelperListener {
            inner,
            connected: Arc::new(AtomicBool::new(false)),
            closed: false,
        })
    }

    pub fn state(&self) -> ChannelState {
        if self.closed {
            ChannelState::Closed
        } else if self.connected.load(Ordering::SeqCst) {
            ChannelState::Connected
        } else {
            ChannelState::Listening
        }
    }

    /// Blocks until a client connects. If a session is already connected,
    /// newly arriving connections are accepted at the transport level and
    /// then immediately dropped (refused), preserving "at most one
    /// client" without the accept loop wedging.
    pub fn accept(&mut self) -> Result<HelperSession> {
        loop {
            let (stream, peer_pid) = self.inner.accept()?;
            if self
                .connected
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Ok(HelperSession::new(stream, self.connected.clone(), peer_pid));
            }
            log::warn!("helper channel: rejecting connection from pid {peer_pid}, already connected");
            // `stream` drops here, closing the rejected connection.
        }
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}
