//! The per user audit loop.
//!
//! Users are processed strictly one at a time. This bounds load on the
//! directory, keeps error attribution to a single user, and makes the
//! progress counts monotonic for any observer.

use std::future::Future;

use passkey_audit_client::ClientError;
use passkey_audit_proto::{AuthenticationMethod, ReportRow, UserIdentity};
use uuid::Uuid;

/// Emitted after each user is processed, whatever the outcome.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Number of users processed so far, including this one.
    pub current: usize,
    pub total: usize,
    pub user_principal_name: &'a str,
}

#[derive(Debug, Default)]
pub struct AuditOutcome {
    /// Users with no FIDO2 security key, in retrieval order, unsorted.
    pub rows: Vec<ReportRow>,
    /// Users whose methods were successfully evaluated.
    pub audited: usize,
    /// Users excluded because their method lookup failed.
    pub skipped: usize,
}

/// True iff no method in the set is a FIDO2 security key. A user with zero
/// registered methods therefore lacks one.
pub fn lacks_fido2(methods: &[AuthenticationMethod]) -> bool {
    !methods.iter().any(|m| m.is_fido2_security_key())
}

/// Evaluate every user in `users` against `lookup`. A lookup failure is
/// warned and that user is excluded from the outcome rows entirely - it is
/// counted in `skipped` rather than treated as compliant or non-compliant.
/// `progress` is invoked once per user after it has been processed.
pub async fn audit_users<F, Fut>(
    users: &[UserIdentity],
    lookup: F,
    mut progress: impl FnMut(Progress<'_>),
) -> AuditOutcome
where
    F: Fn(Uuid) -> Fut,
    Fut: Future<Output = Result<Vec<AuthenticationMethod>, ClientError>>,
{
    let total = users.len();
    let mut outcome = AuditOutcome::default();

    for (idx, user) in users.iter().enumerate() {
        match lookup(user.id).await {
            Ok(methods) => {
                outcome.audited += 1;
                if lacks_fido2(&methods) {
                    outcome.rows.push(ReportRow::from(user));
                }
            }
            Err(e) => {
                warn!(
                    "Unable to read authentication methods for {} - {:?} - user excluded from the report",
                    user.user_principal_name, e
                );
                outcome.skipped += 1;
            }
        }

        progress(Progress {
            current: idx + 1,
            total,
            user_principal_name: &user.user_principal_name,
        });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(display_name: &str, upn: &str) -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            user_principal_name: upn.to_string(),
        }
    }

    fn password() -> AuthenticationMethod {
        AuthenticationMethod::Password { id: None }
    }

    fn fido2() -> AuthenticationMethod {
        AuthenticationMethod::Fido2SecurityKey {
            id: None,
            display_name: None,
            model: None,
        }
    }

    #[test]
    fn test_lacks_fido2() {
        assert!(lacks_fido2(&[]));
        assert!(lacks_fido2(&[password()]));
        assert!(lacks_fido2(&[password(), AuthenticationMethod::Unknown]));
        assert!(!lacks_fido2(&[password(), fido2()]));
        assert!(!lacks_fido2(&[fido2()]));
    }

    #[tokio::test]
    async fn test_audit_report_set() {
        let users = vec![
            user("Amy Admin", "amy@example.com"),
            user("Bob Builder", "bob@example.com"),
        ];
        let amy = users[0].id;

        let outcome = audit_users(
            &users,
            |id| async move {
                if id == amy {
                    Ok(vec![password()])
                } else {
                    Ok(vec![password(), fido2()])
                }
            },
            |_| {},
        )
        .await;

        assert_eq!(outcome.audited, 2);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].user_principal_name, "amy@example.com");
    }

    #[tokio::test]
    async fn test_audit_per_user_failure_isolation() {
        // B's lookup fails: A and C must still be evaluated correctly, and B
        // must appear in neither set.
        let users = vec![
            user("A", "a@example.com"),
            user("B", "b@example.com"),
            user("C", "c@example.com"),
        ];
        let b = users[1].id;
        let c = users[2].id;

        let outcome = audit_users(
            &users,
            |id| async move {
                if id == b {
                    Err(ClientError::AuthenticationFailed)
                } else if id == c {
                    Ok(vec![fido2()])
                } else {
                    Ok(vec![])
                }
            },
            |_| {},
        )
        .await;

        assert_eq!(outcome.audited, 2);
        assert_eq!(outcome.skipped, 1);
        let upns: Vec<_> = outcome
            .rows
            .iter()
            .map(|r| r.user_principal_name.as_str())
            .collect();
        assert_eq!(upns, vec!["a@example.com"]);
    }

    #[tokio::test]
    async fn test_audit_progress_monotonic() {
        let users = vec![
            user("A", "a@example.com"),
            user("B", "b@example.com"),
            user("C", "c@example.com"),
        ];

        let mut seen: Vec<(usize, usize, String)> = Vec::new();
        let _ = audit_users(
            &users,
            |_| async { Ok(vec![]) },
            |p| seen.push((p.current, p.total, p.user_principal_name.to_string())),
        )
        .await;

        assert_eq!(
            seen,
            vec![
                (1, 3, "a@example.com".to_string()),
                (2, 3, "b@example.com".to_string()),
                (3, 3, "c@example.com".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_audit_idempotent() {
        let users = vec![
            user("Amy Admin", "amy@example.com"),
            user("Bob Builder", "bob@example.com"),
        ];

        let run = || async {
            audit_users(&users, |_| async { Ok(vec![password()]) }, |_| {})
                .await
                .rows
        };

        let first = run().await;
        let second = run().await;
        assert_eq!(first, second);
    }
}
