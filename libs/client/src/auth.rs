//! Session establishment against the authority's token endpoint.

use crate::{ClientError, GraphClient};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl GraphClient {
    /// Acquire a session for the requested scope set via the client
    /// credentials grant, and store the resulting bearer token for subsequent
    /// calls. A single attempt is made - on failure the caller is expected to
    /// abort the run.
    pub async fn establish_session(
        &self,
        client_secret: &str,
        scopes: &[&str],
    ) -> Result<(), ClientError> {
        let dest = self.token_endpoint()?;
        let client_id = self.client_id()?.to_string();
        let scope = scopes.join(" ");

        debug!("Requesting token from {} for scopes [{}]", dest, scope);

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
            ("scope", scope.as_str()),
        ];

        let response = self
            .client
            .post(dest.as_str())
            .form(&params)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        match response.status() {
            reqwest::StatusCode::OK => {}
            unexpect => {
                error!(
                    "Authentication request rejected by the identity provider - {}",
                    unexpect
                );
                let body = response.text().await.unwrap_or_default();
                debug!(?body, "token endpoint response");
                return Err(ClientError::AuthenticationFailed);
            }
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::JsonDecode(e, "token_endpoint".to_string()))?;

        if let Some(expires_in) = token.expires_in {
            debug!("Session token expires in {}s", expires_in);
        }

        self.set_token(token.access_token).await;
        Ok(())
    }
}
