#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

#[macro_use]
extern crate tracing;

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::time::Duration;

use passkey_audit_proto::constants::{APPLICATION_JSON, DEFAULT_AUTHORITY, DEFAULT_GRAPH_ENDPOINT};
use passkey_audit_proto::ApiErrorResponse;
use reqwest::header::ACCEPT;
pub use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

mod auth;
mod methods;
mod users;

pub use crate::users::normalize_domain_filter;

/// Correlation id header the directory attaches to every response. Included
/// in errors so an operator can raise it with the service.
const REQUEST_ID: &str = "request-id";

/// Header required by the directory for advanced query capabilities such as
/// `endsWith` filters.
const CONSISTENCY_LEVEL: &str = "ConsistencyLevel";

#[derive(Debug)]
pub enum ClientError {
    Unauthorized,
    Http(reqwest::StatusCode, Option<ApiErrorResponse>, String),
    Transport(reqwest::Error),
    AuthenticationFailed,
    JsonDecode(reqwest::Error, String),
    ConfigParseIssue(String),
}

/// One page of a collection response. The directory returns collections as
/// `value` arrays with an opaque absolute `@odata.nextLink` while more pages
/// remain.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionPage<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GraphClientConfig {
    pub uri: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub authority: Option<String>,
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct GraphClientBuilder {
    address: Option<String>,
    tenant_id: Option<String>,
    client_id: Option<String>,
    authority: Option<String>,
    connect_timeout: Option<u64>,
    use_system_proxies: bool,
}

impl Display for GraphClientBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.address {
            Some(value) => writeln!(f, "address: {}", value)?,
            None => writeln!(f, "address: unset")?,
        }
        match &self.tenant_id {
            Some(value) => writeln!(f, "tenant_id: {}", value)?,
            None => writeln!(f, "tenant_id: unset")?,
        }
        match &self.client_id {
            Some(value) => writeln!(f, "client_id: {}", value)?,
            None => writeln!(f, "client_id: unset")?,
        }
        match &self.authority {
            Some(value) => writeln!(f, "authority: {}", value)?,
            None => writeln!(f, "authority: unset")?,
        }
        match self.connect_timeout {
            Some(value) => writeln!(f, "connect_timeout: {}", value)?,
            None => writeln!(f, "connect_timeout: unset")?,
        }
        writeln!(f, "use_system_proxies: {}", self.use_system_proxies)
    }
}

#[derive(Debug)]
pub struct GraphClient {
    pub(crate) client: reqwest::Client,
    pub(crate) addr: String,
    pub(crate) builder: GraphClientBuilder,
    pub(crate) bearer_token: RwLock<Option<String>>,
}

impl GraphClientBuilder {
    pub fn new() -> Self {
        GraphClientBuilder {
            address: None,
            tenant_id: None,
            client_id: None,
            authority: None,
            connect_timeout: None,
            use_system_proxies: true,
        }
    }

    fn apply_config_options(self, gcc: GraphClientConfig) -> Result<Self, ClientError> {
        let GraphClientBuilder {
            address,
            tenant_id,
            client_id,
            authority,
            connect_timeout,
            use_system_proxies,
        } = self;
        // Process and apply all our options if they exist.
        let address = match gcc.uri {
            Some(uri) => Some(uri),
            None => {
                debug!("No URI in config supplied to apply_config_options");
                address
            }
        };
        let tenant_id = gcc.tenant_id.or(tenant_id);
        let client_id = gcc.client_id.or(client_id);
        let authority = gcc.authority.or(authority);
        let connect_timeout = gcc.connect_timeout.or(connect_timeout);

        Ok(GraphClientBuilder {
            address,
            tenant_id,
            client_id,
            authority,
            connect_timeout,
            use_system_proxies,
        })
    }

    #[allow(clippy::result_unit_err)]
    pub fn read_options_from_optional_config<P: AsRef<Path> + std::fmt::Debug>(
        self,
        config_path: P,
    ) -> Result<Self, ClientError> {
        debug!("Attempting to load configuration from {:#?}", &config_path);

        if !config_path.as_ref().exists() {
            debug!("{:?} does not exist, skipping.", config_path);
            return Ok(self);
        };

        let mut f = match File::open(&config_path) {
            Ok(f) => {
                debug!("Successfully opened configuration file {:#?}", &config_path);
                f
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::NotFound => {
                        debug!(
                            "Configuration file {:#?} not found, skipping.",
                            &config_path
                        );
                    }
                    ErrorKind::PermissionDenied => {
                        warn!(
                            "Permission denied loading configuration file {:#?}, skipping.",
                            &config_path
                        );
                    }
                    _ => {
                        debug!(
                            "Unable to open config file {:#?} [{:?}], skipping ...",
                            &config_path, e
                        );
                    }
                };
                return Ok(self);
            }
        };

        let mut contents = String::new();
        f.read_to_string(&mut contents).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;

        let config: GraphClientConfig = toml::from_str(contents.as_str()).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;

        self.apply_config_options(config)
    }

    pub fn address(self, address: String) -> Self {
        GraphClientBuilder {
            address: Some(address),
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            authority: self.authority,
            connect_timeout: self.connect_timeout,
            use_system_proxies: self.use_system_proxies,
        }
    }

    pub fn tenant_id(self, tenant_id: String) -> Self {
        GraphClientBuilder {
            address: self.address,
            tenant_id: Some(tenant_id),
            client_id: self.client_id,
            authority: self.authority,
            connect_timeout: self.connect_timeout,
            use_system_proxies: self.use_system_proxies,
        }
    }

    pub fn client_id(self, client_id: String) -> Self {
        GraphClientBuilder {
            address: self.address,
            tenant_id: self.tenant_id,
            client_id: Some(client_id),
            authority: self.authority,
            connect_timeout: self.connect_timeout,
            use_system_proxies: self.use_system_proxies,
        }
    }

    pub fn authority(self, authority: String) -> Self {
        GraphClientBuilder {
            address: self.address,
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            authority: Some(authority),
            connect_timeout: self.connect_timeout,
            use_system_proxies: self.use_system_proxies,
        }
    }

    pub fn connect_timeout(self, secs: u64) -> Self {
        GraphClientBuilder {
            address: self.address,
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            authority: self.authority,
            connect_timeout: Some(secs),
            use_system_proxies: self.use_system_proxies,
        }
    }

    pub fn no_proxy(self) -> Self {
        GraphClientBuilder {
            address: self.address,
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            authority: self.authority,
            connect_timeout: self.connect_timeout,
            use_system_proxies: false,
        }
    }

    /// Generates a useragent header based on the package name and version
    pub fn user_agent() -> &'static str {
        static APP_USER_AGENT: &str =
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
        APP_USER_AGENT
    }

    /// Build the client ready for usage.
    pub fn build(self) -> Result<GraphClient, ClientError> {
        let address = self
            .address
            .clone()
            .unwrap_or_else(|| DEFAULT_GRAPH_ENDPOINT.to_string());

        if !address.starts_with("https://") {
            warn!("Address does not start with 'https://' - this may allow network interception of tokens!");
        }

        let client_builder = reqwest::Client::builder().user_agent(Self::user_agent());

        let client_builder = match self.use_system_proxies {
            true => client_builder,
            false => client_builder.no_proxy(),
        };

        let client_builder = match &self.connect_timeout {
            Some(secs) => client_builder
                .connect_timeout(Duration::from_secs(*secs))
                .timeout(Duration::from_secs(*secs)),
            None => client_builder,
        };

        let client = client_builder.build().map_err(ClientError::Transport)?;

        // Check the address parses now, rather than on the first request.
        Url::parse(&address)
            .map_err(|e| ClientError::ConfigParseIssue(format!("invalid uri {} - {:?}", address, e)))?;

        Ok(GraphClient {
            client,
            addr: address,
            builder: self,
            bearer_token: RwLock::new(None),
        })
    }
}

impl GraphClient {
    pub fn get_url(&self) -> &str {
        self.addr.as_str()
    }

    pub async fn set_token(&self, new_token: String) {
        let mut tguard = self.bearer_token.write().await;
        *tguard = Some(new_token);
    }

    pub async fn get_token(&self) -> Option<String> {
        let tguard = self.bearer_token.read().await;
        (*tguard).as_ref().cloned()
    }

    /// Release the session. The directory issues bearer tokens without a
    /// revocation call, so this drops the cached token locally. Best effort,
    /// never escalated.
    pub async fn logout(&self) {
        let mut tguard = self.bearer_token.write().await;
        if tguard.take().is_some() {
            debug!("Session token released");
        }
    }

    /// Perform a GET against `dest`. `dest` is either a path relative to the
    /// configured endpoint, or an absolute URL as handed back in a
    /// `@odata.nextLink`. When `eventual` is set the consistency header
    /// required for advanced queries is attached.
    pub(crate) async fn perform_get_request<T: DeserializeOwned>(
        &self,
        dest: &str,
        eventual: bool,
    ) -> Result<T, ClientError> {
        let dest = if dest.starts_with("https://") || dest.starts_with("http://") {
            dest.to_string()
        } else {
            format!("{}{}", self.get_url(), dest)
        };

        let response = self
            .client
            .get(dest.as_str())
            .header(ACCEPT, APPLICATION_JSON);

        let response = if eventual {
            response.header(CONSISTENCY_LEVEL, "eventual")
        } else {
            response
        };

        let response = {
            let tguard = self.bearer_token.read().await;
            if let Some(token) = &(*tguard) {
                response.bearer_auth(token)
            } else {
                return Err(ClientError::Unauthorized);
            }
        };

        let response = response.send().await.map_err(ClientError::Transport)?;

        let opid = response
            .headers()
            .get(REQUEST_ID)
            .and_then(|hv| hv.to_str().ok())
            .unwrap_or("missing_request_id")
            .to_string();
        debug!("request-id -> {:?}", opid);

        match response.status() {
            reqwest::StatusCode::OK => {}
            unexpect => {
                return Err(ClientError::Http(
                    unexpect,
                    response.json().await.ok(),
                    opid,
                ))
            }
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::JsonDecode(e, opid))
    }

    /// Drain a paged collection into a single vec, following next links until
    /// the directory reports no more pages.
    pub(crate) async fn perform_paged_get<T: DeserializeOwned>(
        &self,
        dest: &str,
        eventual: bool,
    ) -> Result<Vec<T>, ClientError> {
        let mut out: Vec<T> = Vec::new();
        let mut next = Some(dest.to_string());
        while let Some(dest) = next {
            let page: CollectionPage<T> = self.perform_get_request(&dest, eventual).await?;
            out.extend(page.value);
            next = page.next_link;
        }
        Ok(out)
    }

    /// Access the token acquisition endpoint for this client's authority and
    /// tenant.
    pub(crate) fn token_endpoint(&self) -> Result<String, ClientError> {
        let authority = self
            .builder
            .authority
            .clone()
            .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string());
        let tenant_id = self.builder.tenant_id.clone().ok_or_else(|| {
            ClientError::ConfigParseIssue(
                "tenant_id missing from client configuration".to_string(),
            )
        })?;
        Ok(format!("{}/{}/oauth2/v2.0/token", authority, tenant_id))
    }

    pub(crate) fn client_id(&self) -> Result<&str, ClientError> {
        self.builder.client_id.as_deref().ok_or_else(|| {
            ClientError::ConfigParseIssue(
                "client_id missing from client configuration".to_string(),
            )
        })
    }
}
