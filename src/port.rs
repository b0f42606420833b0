//! Listening-port acquisition.
//!
//! The allocator runs exactly once at startup. A requested port of 0 means
//! "any free port"; a concrete requested port is tried first and, when the
//! bind fails (already in use, insufficient privilege), the allocator falls
//! back to OS-assigned ports rather than failing the whole startup. The
//! fallback is bounded so startup latency stays predictable; only when every
//! attempt fails does startup abort.

use std::net::Ipv4Addr;

use tokio::net::TcpListener;
use tracing::warn;

use crate::error::PortError;

/// Upper bound on OS-assigned fallback binds after the requested port fails.
pub const MAX_FALLBACK_ATTEMPTS: u32 = 3;

/// The outcome of port acquisition: the port that was asked for, the port
/// actually listened on, and how many binds it took. Created once at startup
/// and read-only afterwards.
#[derive(Debug)]
pub struct PortBinding {
    /// Port the configuration asked for (0 = auto).
    pub requested_port: u16,
    /// Port the listener is actually bound to.
    pub bound_port: u16,
    /// Number of bind attempts performed, including the successful one.
    pub attempts: u32,
    listener: TcpListener,
}

impl PortBinding {
    /// Whether the OS-assigned fallback was taken.
    pub fn fell_back(&self) -> bool {
        self.requested_port != 0 && self.bound_port != self.requested_port
    }

    /// Hand the live listener to the server; the metadata stays behind.
    pub fn into_listener(self) -> TcpListener {
        self.listener
    }
}

/// Acquire a bindable TCP port.
///
/// Binds on all interfaces. With `requested_port == 0` the OS picks a free
/// port directly. Otherwise the exact port is tried once; on failure up to
/// [`MAX_FALLBACK_ATTEMPTS`] OS-assigned binds are attempted before giving
/// up with [`PortError::Exhausted`].
pub async fn acquire(requested_port: u16) -> Result<PortBinding, PortError> {
    let mut attempts = 0u32;

    if requested_port != 0 {
        attempts += 1;
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, requested_port)).await {
            Ok(listener) => return binding(requested_port, listener, attempts),
            Err(e) => {
                warn!(
                    port = requested_port,
                    error = %e,
                    "requested port unavailable, falling back to an OS-assigned port"
                );
            }
        }
    }

    let mut last_error = None;
    for _ in 0..MAX_FALLBACK_ATTEMPTS {
        attempts += 1;
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).await {
            Ok(listener) => return binding(requested_port, listener, attempts),
            Err(e) => last_error = Some(e),
        }
    }

    Err(PortError::Exhausted {
        requested: requested_port,
        attempts,
        source: last_error
            .unwrap_or_else(|| std::io::Error::other("no bind attempt recorded")),
    })
}

fn binding(
    requested_port: u16,
    listener: TcpListener,
    attempts: u32,
) -> Result<PortBinding, PortError> {
    let bound_port = listener
        .local_addr()
        .map_err(|source| PortError::AddrLookup { source })?
        .port();
    Ok(PortBinding {
        requested_port,
        bound_port,
        attempts,
        listener,
    })
}

// =============================================================================
// Tests
// =============================================================================
