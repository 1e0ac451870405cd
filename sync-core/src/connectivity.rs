//! Reconnect edge detection.

/// Turns a stream of reachability samples into offline→online edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectEdge {
    online: bool,
}

impl ReconnectEdge {
    /// Start from a known reachability.
    pub fn new(online: bool) -> Self {
        Self { online }
    }

    /// Record a sample. True only when it flips offline to online.
    pub fn observe(&mut self, online: bool) -> bool {
        let edge = !self.online && online;
        self.online = online;
        edge
    }

    /// Last observed reachability.
    pub fn is_online(&self) -> bool {
        self.online
    }
}
