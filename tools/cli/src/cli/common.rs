use crate::CommonOpt;
use passkey_audit_client::{GraphClient, GraphClientBuilder};
use passkey_audit_proto::constants::{
    AUDIT_SCOPES, DEFAULT_CLIENT_CONFIG_PATH, DEFAULT_CLIENT_CONFIG_PATH_HOME,
};

/// Environment variable the client secret is read from. When unset the user
/// is prompted on the terminal instead, so the secret never has to appear in
/// shell history.
pub const ENV_CLIENT_SECRET: &str = "PASSKEY_AUDIT_CLIENT_SECRET";

impl CommonOpt {
    pub fn to_unauth_client(&self) -> GraphClient {
        let config_path: String = shellexpand::tilde(DEFAULT_CLIENT_CONFIG_PATH_HOME).into_owned();

        let client_builder = GraphClientBuilder::new()
            .read_options_from_optional_config(DEFAULT_CLIENT_CONFIG_PATH)
            .map_err(|e| {
                error!(
                    "Failed to parse config ({:?}) -- {:?}",
                    DEFAULT_CLIENT_CONFIG_PATH, e
                );
                e
            })
            .and_then(|cb| {
                cb.read_options_from_optional_config(&config_path)
                    .map_err(|e| {
                        error!("Failed to parse config ({:?}) -- {:?}", config_path, e);
                        e
                    })
            })
            .and_then(|cb| match &self.config_path {
                // An explicitly given file is layered last so it overrides
                // the default locations.
                Some(p) => cb.read_options_from_optional_config(p).map_err(|e| {
                    error!("Failed to parse config ({:?}) -- {:?}", p, e);
                    e
                }),
                None => Ok(cb),
            })
            .unwrap_or_else(|_e| {
                std::process::exit(1);
            });
        debug!(
            "Successfully loaded configuration, looked in {} and {} - client builder state: {:?}",
            DEFAULT_CLIENT_CONFIG_PATH, DEFAULT_CLIENT_CONFIG_PATH_HOME, &client_builder
        );

        let client_builder = match &self.addr {
            Some(a) => client_builder.address(a.to_string()),
            None => client_builder,
        };

        let client_builder = match &self.tenant_id {
            Some(t) => client_builder.tenant_id(t.to_string()),
            None => client_builder,
        };

        let client_builder = match &self.client_id {
            Some(c) => client_builder.client_id(c.to_string()),
            None => client_builder,
        };

        client_builder.build().unwrap_or_else(|e| {
            error!("Failed to build client instance -- {:?}", e);
            std::process::exit(1);
        })
    }

    /// Build a client and establish the audit session with the fixed read
    /// only scope set. Session failure is fatal - the process terminates
    /// non-zero here and never proceeds to list users.
    pub async fn to_client(&self) -> GraphClient {
        let client = self.to_unauth_client();

        let secret = match std::env::var(ENV_CLIENT_SECRET) {
            Ok(s) => s,
            Err(_) => match rpassword::prompt_password("Client secret: ") {
                Ok(s) => s,
                Err(e) => {
                    error!("Failed to read client secret from terminal -- {:?}", e);
                    std::process::exit(1);
                }
            },
        };

        if let Err(e) = client.establish_session(&secret, &AUDIT_SCOPES).await {
            error!("Failed to establish a directory session -- {:?}", e);
            std::process::exit(1);
        }

        client
    }
}

#[cfg(test)]
mod tests {
    use crate::{AuditParser, CommonOpt};
    use clap::Parser;
    use uuid::Uuid;

    #[test]
    fn test_config_flag_parses() {
        let opt = AuditParser::try_parse_from([
            "passkey-audit",
            "--config",
            "/tmp/passkey-audit-config",
        ])
        .expect("failed to parse args");
        assert_eq!(
            opt.copt.config_path.as_deref(),
            Some(std::path::Path::new("/tmp/passkey-audit-config"))
        );

        let opt = AuditParser::try_parse_from(["passkey-audit", "-C", "/tmp/other-config"])
            .expect("failed to parse args");
        assert_eq!(
            opt.copt.config_path.as_deref(),
            Some(std::path::Path::new("/tmp/other-config"))
        );
    }

    #[test]
    fn test_config_flag_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("passkey-audit-config-{}", Uuid::new_v4()));
        std::fs::write(&path, "uri = \"https://graph.example.net/v1.0\"\n")
            .expect("failed to write config");

        let copt = CommonOpt {
            debug: false,
            addr: None,
            tenant_id: None,
            client_id: None,
            config_path: Some(path.clone()),
        };
        let client = copt.to_unauth_client();
        assert_eq!(client.get_url(), "https://graph.example.net/v1.0");

        std::fs::remove_file(&path).expect("failed to clean up");
    }
}
