use serde::Serialize;

pub const ONLINE_TIMEOUT_SECS: i64 = 30;
pub const DEVICE_ID_MAX: usize = 64;
pub const FIRMWARE_MAX: usize = 32;

/// Last reported hardware identity and heartbeat of the remote gateway.
/// `device_id` and `firmware` stay empty until the first heartbeat arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayLiveness {
    pub status: i64,
    pub last_seen: i64,
    pub device_id: String,
    pub firmware: String,
}

impl GatewayLiveness {
    /// Online-ness is derived at read time; there is no background timer.
    /// A gateway that has never sent a heartbeat is offline.
    pub fn is_online_at(&self, now: i64) -> bool {
        self.last_seen != 0 && now - self.last_seen < ONLINE_TIMEOUT_SECS
    }
}

/// Bound a reported string to `max` characters, respecting char boundaries.
pub fn truncate_to(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatusResponse {
    pub status: i64,
    pub is_online: bool,
    pub device_id: String,
    pub firmware: String,
    pub last_seen: i64,
    pub seconds_since_last_seen: i64,
}
