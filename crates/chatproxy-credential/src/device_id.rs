use chatproxy_common::AuthSettings;
use uuid::Uuid;

/// Namespace for name-based device ids. Changing it changes every derived id.
pub const DEVICE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_567812345678);

pub fn device_id_from_seed(seed: &str) -> String {
    Uuid::new_v5(&DEVICE_ID_NAMESPACE, seed.as_bytes()).to_string()
}

/// Device id for this process.
///
/// An explicit id wins. Otherwise the id is derived from the first available of
/// username, refresh token and static access token, so the same account keeps
/// the same device across restarts. With no seed at all a random one is used.
pub fn resolve_device_id(auth: &AuthSettings) -> String {
    if let Some(device_id) = auth.device_id.as_deref() {
        return device_id.to_string();
    }
    let seed = auth
        .email
        .as_deref()
        .or(auth.refresh_token.as_deref())
        .or(auth.access_token.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    device_id_from_seed(&seed)
}
