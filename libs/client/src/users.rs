//! User listing with server side domain filtering.

use crate::{ClientError, GraphClient};
use passkey_audit_proto::UserIdentity;
use url::Url;

/// The audit only consumes these three properties, so only these are
/// requested.
const USER_PROJECTION: &str = "id,displayName,userPrincipalName";

/// Normalize a domain filter to suffix form. `contoso.com` and `@contoso.com`
/// both yield `@contoso.com`.
pub fn normalize_domain_filter(domain: &str) -> String {
    if domain.starts_with('@') {
        domain.to_string()
    } else {
        format!("@{}", domain)
    }
}

/// The `endsWith` predicate on the principal name, pushed down to the
/// directory's query language so the full directory is never transferred.
fn endswith_filter(suffix: &str) -> String {
    format!("endsWith(userPrincipalName,'{}')", suffix)
}

impl GraphClient {
    /// List every user in the directory, optionally restricted to principals
    /// whose name ends with `domain_filter`. Pagination is followed to
    /// exhaustion - zero matches is an empty vec, not an error.
    pub async fn list_users(
        &self,
        domain_filter: Option<&str>,
    ) -> Result<Vec<UserIdentity>, ClientError> {
        let mut url = Url::parse(&format!("{}/users", self.get_url()))
            .map_err(|e| ClientError::ConfigParseIssue(format!("invalid uri - {:?}", e)))?;

        url.query_pairs_mut().append_pair("$select", USER_PROJECTION);

        let filtered = domain_filter.is_some();
        if let Some(suffix) = domain_filter.map(normalize_domain_filter) {
            // The directory requires $count with an eventual consistency
            // header for endsWith filters.
            url.query_pairs_mut()
                .append_pair("$filter", &endswith_filter(&suffix))
                .append_pair("$count", "true");
        }

        self.perform_paged_get(url.as_str(), filtered).await
    }
}
