//! Connectivity observation and probing.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Current connectivity as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    /// The network is reachable.
    Online,
    /// The network is unreachable.
    Offline,
    /// No observation has arrived yet. Callers must not treat this as
    /// either online or offline.
    #[default]
    Unknown,
}

impl NetworkStatus {
    /// Returns true only for a confirmed online observation.
    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self, NetworkStatus::Online)
    }
}

/// An active connectivity check run on demand before a sync attempt.
pub trait ConnectivityProbe: Send + Sync {
    /// Returns true if the network is currently reachable.
    fn probe(&self) -> bool;
}

/// A probe with a settable answer, for tests and wiring.
#[derive(Debug)]
pub struct StaticProbe {
    online: AtomicBool,
}

impl StaticProbe {
    /// Creates a probe that answers `online`.
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// Changes the probe's answer.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl ConnectivityProbe for StaticProbe {
    fn probe(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Tracks connectivity transitions fed in by the host platform.
///
/// The monitor starts in [`NetworkStatus::Unknown`] until the first
/// observation arrives. OS-level transitions are fed in via [`observe`];
/// [`check_connection`] runs the active probe for on-demand verification.
///
/// [`observe`]: NetworkMonitor::observe
/// [`check_connection`]: NetworkMonitor::check_connection
pub struct NetworkMonitor {
    status: RwLock<NetworkStatus>,
    probe: Arc<dyn ConnectivityProbe>,
}

impl NetworkMonitor {
    /// Creates a monitor in the `Unknown` state with the given probe.
    #[must_use]
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            status: RwLock::new(NetworkStatus::Unknown),
            probe,
        }
    }

    /// Returns the last observed status.
    #[must_use]
    pub fn status(&self) -> NetworkStatus {
        *self.status.read()
    }

    /// Records an observed transition and returns the previous status, so
    /// callers can detect edges.
    pub fn observe(&self, status: NetworkStatus) -> NetworkStatus {
        let mut current = self.status.write();
        let previous = *current;
        *current = status;
        if previous != status {
            debug!(?previous, ?status, "connectivity changed");
        }
        previous
    }

    /// Runs the active probe, records the result, and returns whether the
    /// network is reachable.
    pub fn check_connection(&self) -> bool {
        let online = self.probe.probe();
        self.observe(if online {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        });
        online
    }

    /// Returns true only for an offline-to-online edge. A first
    /// observation out of `Unknown` is not a regained connection.
    #[must_use]
    pub fn came_online(previous: NetworkStatus, current: NetworkStatus) -> bool {
        previous == NetworkStatus::Offline && current == NetworkStatus::Online
    }
}
