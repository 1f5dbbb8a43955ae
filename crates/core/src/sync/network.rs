//! Network state used to gate synchronization.

use std::sync::atomic::{AtomicBool, Ordering};

/// Reports connectivity.
pub trait NetworkMonitor: Send + Sync {
    /// A network connection is available.
    fn is_online(&self) -> bool;

    /// The connection is unmetered.
    fn is_on_wifi(&self) -> bool;
}

/// Connectivity set explicitly by the caller.
#[derive(Debug)]
pub struct StaticNetwork {
    online: AtomicBool,
    wifi: AtomicBool,
}

impl StaticNetwork {
    /// Creates a monitor with the given state.
    #[must_use]
    pub fn new(online: bool, wifi: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            wifi: AtomicBool::new(wifi),
        }
    }

    /// Online on an unmetered connection.
    #[must_use]
    pub fn wifi() -> Self {
        Self::new(true, true)
    }

    /// Updates the online flag.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    /// Updates the unmetered flag.
    pub fn set_wifi(&self, wifi: bool) {
        self.wifi.store(wifi, Ordering::Relaxed);
    }
}

impl NetworkMonitor for StaticNetwork {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    fn is_on_wifi(&self) -> bool {
        self.is_online() && self.wifi.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_network() {
        let network = StaticNetwork::new(true, false);
        assert!(network.is_online());
        assert!(!network.is_on_wifi());

        network.set_wifi(true);
        assert!(network.is_on_wifi());

        network.set_online(false);
        assert!(!network.is_online());
        assert!(!network.is_on_wifi());
    }
}
