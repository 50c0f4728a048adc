use std::fmt;

/// Provider tag baked into every session key.
const SESSION_PROVIDER: &str = "openai";

/// Stable per-board identifier derived from the factory eFuse MAC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Build the identity from the eFuse MAC read as a little-endian integer:
    /// the high 16 bits followed by the low 32 bits, uppercase and zero padded.
    pub fn from_efuse_mac(mac: u64) -> Self {
        DeviceIdentity(format!("{:04X}{:08X}", (mac >> 32) as u16, mac as u32))
    }

    /// Same as [`DeviceIdentity::from_efuse_mac`] starting from the six raw MAC bytes.
    pub fn from_mac_bytes(mac: [u8; 6]) -> Self {
        let mut wide = [0u8; 8];
        wide[..6].copy_from_slice(&mac);
        Self::from_efuse_mac(u64::from_le_bytes(wide))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Labels this device's conversation on the gateway, sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn compose(agent_id: &str, identity: &DeviceIdentity) -> Self {
        SessionKey(format!(
            "agent:{}:{}:esp32-{}",
            agent_id,
            SESSION_PROVIDER,
            identity.as_str()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
