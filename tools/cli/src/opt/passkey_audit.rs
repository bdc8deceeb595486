use clap::Args;

#[derive(Debug, Args, Clone)]
pub struct CommonOpt {
    /// Enable debugging of the passkey-audit tool
    #[clap(short = 'D', long = "debug", env = "PASSKEY_AUDIT_DEBUG")]
    pub debug: bool,
    /// Address of the directory API endpoint, including the version segment
    #[clap(short = 'H', long = "url", env = "PASSKEY_AUDIT_URL")]
    pub addr: Option<String>,
    /// Directory (tenant) identifier the session is established against
    #[clap(long = "tenant-id", env = "PASSKEY_AUDIT_TENANT_ID")]
    pub tenant_id: Option<String>,
    /// Application (client) identifier used for the session
    #[clap(long = "client-id", env = "PASSKEY_AUDIT_CLIENT_ID")]
    pub client_id: Option<String>,
    /// Path to a client configuration file, read after the default locations
    #[clap(short = 'C', long = "config", env = "PASSKEY_AUDIT_CONFIG")]
    pub config_path: Option<std::path::PathBuf>,
}

#[derive(Debug, clap::Parser, Clone)]
#[clap(
    name = "passkey-audit",
    version,
    about = "Report directory users without a registered FIDO2 security key"
)]
pub struct AuditParser {
    #[clap(flatten)]
    pub copt: CommonOpt,

    /// Restrict the audit to users whose principal name ends with this
    /// domain suffix. A leading '@' is added when absent.
    #[clap(long = "domain-filter")]
    pub domain_filter: Option<String>,

    /// Export the report as a CSV file as well as printing it
    #[clap(long = "export-csv")]
    pub export_csv: bool,

    /// Directory the CSV report is written to
    #[clap(long = "output-path", default_value = "./fido2-audit-reports")]
    pub output_path: std::path::PathBuf,
}
