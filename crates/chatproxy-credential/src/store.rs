use std::sync::Arc;

use arc_swap::ArcSwap;

/// Credential material attached to upstream requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    pub access_token: String,
    pub puid: String,
    pub device_id: String,
}

/// Shared holder for [`CredentialState`].
///
/// Writers replace the whole snapshot, so readers always see a consistent
/// triple. Only the refresh loop writes; the device id never changes after
/// construction.
#[derive(Debug)]
pub struct CredentialStore {
    state: ArcSwap<CredentialState>,
}

impl CredentialStore {
    pub fn new(initial: CredentialState) -> Self {
        Self {
            state: ArcSwap::from_pointee(initial),
        }
    }

    pub fn snapshot(&self) -> Arc<CredentialState> {
        self.state.load_full()
    }

    pub fn device_id(&self) -> String {
        self.state.load().device_id.clone()
    }

    pub fn store_access_token(&self, access_token: String) {
        self.state.rcu(|current| CredentialState {
            access_token: access_token.clone(),
            ..CredentialState::clone(current)
        });
    }

    pub fn store_puid(&self, puid: String) {
        self.state.rcu(|current| CredentialState {
            puid: puid.clone(),
            ..CredentialState::clone(current)
        });
    }
}
