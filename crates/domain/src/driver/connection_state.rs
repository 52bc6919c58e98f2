use serde::{Deserialize, Serialize};

/// Connection state of the label printer
///
/// `Disconnected -> Connecting -> Connected`; a failed negotiation or a failed
/// transfer drops straight back to `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No device handle is held
    #[default]
    Disconnected,
    /// Picking, opening and claiming a device
    Connecting,
    /// An interface is claimed and a bulk-OUT endpoint is known
    Connected,
}

impl ConnectionState {
    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Transition to disconnected state
    pub fn to_disconnected(&self) -> Self {
        Self::Disconnected
    }
}
