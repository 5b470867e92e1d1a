//! The platform-connection port.

use async_trait::async_trait;

use crosspost_model::Platform;

use crate::StoreError;

/// A decrypted platform credential.
///
/// Token acquisition, storage, and encryption live behind the store; by the
/// time a credential reaches the publish path it is plaintext and ready to
/// present to the platform API.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    /// The platform-side account id (page id, IG user id, etc.).
    pub platform_user_id: String,
}

/// Lookup of a user's active platform connections.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// The owner's decrypted credential for `platform`, or `None` when the
    /// platform is not linked.
    async fn decrypted_credential(
        &self,
        owner_id: &str,
        platform: Platform,
    ) -> Result<Option<Credential>, StoreError>;
}
