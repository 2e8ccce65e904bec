use tracing::{info, warn};
use wreq_util::Emulation;

pub const DEFAULT_PROFILE_NAME: &str = "chrome_137";

/// Known impersonation profiles, addressable by name from configuration.
const PROFILES: &[(&str, Emulation)] = &[
    ("chrome_131", Emulation::Chrome131),
    ("chrome_132", Emulation::Chrome132),
    ("chrome_133", Emulation::Chrome133),
    ("chrome_134", Emulation::Chrome134),
    ("chrome_135", Emulation::Chrome135),
    ("chrome_136", Emulation::Chrome136),
    ("chrome_137", Emulation::Chrome137),
    ("safari_18", Emulation::Safari18),
    ("okhttp_4_10", Emulation::OkHttp4_10),
];

/// TLS/HTTP fingerprint presented to the upstream, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientProfile {
    name: &'static str,
    emulation: Emulation,
}

impl ClientProfile {
    /// Resolves a configured profile name.
    ///
    /// Unset names use the default silently; unknown names use the default and
    /// log which name was rejected.
    pub fn resolve(configured: Option<&str>) -> Self {
        let Some(name) = configured.map(str::trim).filter(|name| !name.is_empty()) else {
            return Self::default();
        };
        match Self::lookup(name) {
            Some(profile) => {
                info!(profile = profile.name, "client profile is used");
                profile
            }
            None => {
                let known = Self::known_names().collect::<Vec<_>>().join(", ");
                warn!(
                    requested = name,
                    profile = DEFAULT_PROFILE_NAME,
                    known = %known,
                    "unknown client profile, using default"
                );
                Self::default()
            }
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        let wanted = name.to_ascii_lowercase();
        PROFILES
            .iter()
            .find(|(candidate, _)| *candidate == wanted)
            .map(|(name, emulation)| Self {
                name,
                emulation: *emulation,
            })
    }

    pub fn known_names() -> impl Iterator<Item = &'static str> {
        PROFILES.iter().map(|(name, _)| *name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn emulation(&self) -> Emulation {
        self.emulation
    }
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME,
            emulation: Emulation::Chrome137,
        }
    }
}
