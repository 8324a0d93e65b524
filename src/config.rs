/// Oldest protocol version the ratchet can still initialize.
pub const MIN_SUPPORTED_VERSION: u32 = 2;

/// Protocol version new sessions are created at.
pub const CURRENT_VERSION: u32 = 3;

/// Settings for [`crate::RatchetingSession`].
#[derive(Clone, Debug)]
pub struct RatchetConfig {
    /// Lowest protocol version accepted for session initialization.
    pub min_version: u32,
    /// Highest protocol version accepted for session initialization.
    pub max_version: u32,
}

impl RatchetConfig {
    /// Whether `version` may be used to initialize a session.
    pub fn supports(&self, version: u32) -> bool {
        (self.min_version..=self.max_version).contains(&version)
    }
}

impl Default for RatchetConfig {
    fn default() -> Self {
        Self {
            min_version: MIN_SUPPORTED_VERSION,
            max_version: CURRENT_VERSION,
        }
    }
}
