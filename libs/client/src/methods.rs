//! Per user authentication method retrieval.

use crate::{ClientError, GraphClient};
use passkey_audit_proto::AuthenticationMethod;
use uuid::Uuid;

impl GraphClient {
    /// Fetch the full set of registered authentication methods for one user.
    /// Paged like every other collection, although in practice a user's
    /// method list fits in a single page.
    pub async fn list_authentication_methods(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AuthenticationMethod>, ClientError> {
        self.perform_paged_get(
            &format!("/users/{}/authentication/methods", user_id),
            false,
        )
        .await
    }
}
