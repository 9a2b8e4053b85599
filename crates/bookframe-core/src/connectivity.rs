//! Connectivity tracking.

/// Connectivity edge reported by [`ConnectivityMonitor::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityChange {
    /// Online → offline.
    WentOffline,
    /// Offline → online.
    CameOnline,
}

/// Mirrors the platform's online flag and reports edges.
///
/// Platforms repeat notifications freely (some webviews fire `offline` on
/// every failed request); repeats produce no edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityMonitor {
    online: bool,
}

impl ConnectivityMonitor {
    /// Monitor seeded with the platform's current value.
    pub fn new(online: bool) -> Self {
        Self { online }
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Apply a notification. Returns the edge, if any.
    pub fn update(&mut self, online: bool) -> Option<ConnectivityChange> {
        if self.online == online {
            return None;
        }
        self.online = online;
        Some(if online { ConnectivityChange::CameOnline } else { ConnectivityChange::WentOffline })
    }
}
