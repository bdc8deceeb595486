//! Constants shared by the client and the audit tool.

/// Default base address of the directory API, including the version segment.
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";

/// Default authority the token request is issued against. The tenant id and
/// the token path are appended to this.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// System wide client configuration.
pub const DEFAULT_CLIENT_CONFIG_PATH: &str = "/etc/passkey-audit/config";
/// Per user client configuration, preferred over the system wide file.
pub const DEFAULT_CLIENT_CONFIG_PATH_HOME: &str = "~/.config/passkey-audit/config";

/// Read access to user records.
pub const SCOPE_USER_READ_ALL: &str = "User.Read.All";
/// Read access to users' registered authentication methods.
pub const SCOPE_AUTH_METHOD_READ_ALL: &str = "UserAuthenticationMethod.Read.All";

/// The fixed, minimal scope set the audit requires. Read only - the audit
/// never requests write permission.
pub const AUDIT_SCOPES: [&str; 2] = [SCOPE_USER_READ_ALL, SCOPE_AUTH_METHOD_READ_ALL];

pub const APPLICATION_JSON: &str = "application/json";
