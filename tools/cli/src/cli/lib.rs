#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
// We allow expect since it forces good error messages at the least.
#![allow(clippy::expect_used)]

#[macro_use]
extern crate tracing;

use std::process::ExitCode;

include!("../opt/passkey_audit.rs");

pub mod audit;
pub mod common;
pub mod report;

use crate::audit::Progress;

impl AuditParser {
    /// Run the audit pipeline: establish a session, list users, evaluate each
    /// user's authentication methods, report and optionally export.
    pub async fn exec(&self) -> ExitCode {
        // Fatal failures inside to_client terminate the process non-zero
        // before any listing occurs.
        let client = self.copt.to_client().await;

        let users = match client.list_users(self.domain_filter.as_deref()).await {
            Ok(users) => users,
            Err(e) => {
                error!("Failed to list directory users - {:?}", e);
                client.logout().await;
                return ExitCode::FAILURE;
            }
        };
        info!("Retrieved {} user(s) from the directory", users.len());

        let outcome = audit::audit_users(
            &users,
            |user_id| client.list_authentication_methods(user_id),
            |p: Progress<'_>| {
                eprint!(
                    "\r({}/{}) {:<50}",
                    p.current, p.total, p.user_principal_name
                );
            },
        )
        .await;
        if !users.is_empty() {
            eprintln!();
        }

        let mut rows = outcome.rows;
        report::sort_rows(&mut rows);
        report::render(&rows);

        info!(
            "Audited {} user(s): {} without a FIDO2 security key, {} skipped due to lookup errors",
            outcome.audited,
            rows.len(),
            outcome.skipped
        );

        if self.export_csv {
            let now = chrono::Local::now().naive_local();
            // Export failure stands alone - the console report above has
            // already been produced, so the run still succeeds.
            match report::export(&rows, &self.output_path, now) {
                Ok(path) => info!("Report exported to {}", path.display()),
                Err(e) => error!(
                    "Failed to export report to {} - {:?}",
                    self.output_path.display(),
                    e
                ),
            }
        } else {
            debug!("CSV export not requested, skipping");
        }

        client.logout().await;
        ExitCode::SUCCESS
    }
}
