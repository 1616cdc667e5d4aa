use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The vendor answered with a non-success status. `message` is already
    /// formatted for display (`Error <status>: <vendor message>`).
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Vendor request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed vendor response: {0}")]
    Decode(String),
}

impl VoiceError {
    /// HTTP status the vendor returned, when the failure came from the vendor.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            VoiceError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}
