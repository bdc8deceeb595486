//! Passkey Audit data types
//!
//! Wire types shared between the directory client and the audit tool. These
//! mirror the identity directory's JSON representation of users and their
//! registered authentication methods.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod constants;

/// A user identity as returned by the directory. Read only - the audit never
/// writes user records back.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Opaque stable object identifier, unique within the directory.
    pub id: Uuid,
    /// Human readable name. Not guaranteed unique.
    #[serde(default)]
    pub display_name: String,
    /// The login identifier in `local@domain` form. Unique.
    pub user_principal_name: String,
}

/// A registered authentication method, keyed by the directory's type
/// discriminant. Only the kind matters to the audit; method specific payload
/// fields beyond a few identifying ones are not modelled. Discriminants we do
/// not recognise select [`AuthenticationMethod::Unknown`] rather than failing
/// the whole response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "@odata.type")]
pub enum AuthenticationMethod {
    #[serde(rename = "#microsoft.graph.fido2AuthenticationMethod")]
    Fido2SecurityKey {
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "displayName")]
        display_name: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    #[serde(rename = "#microsoft.graph.passwordAuthenticationMethod")]
    Password {
        #[serde(default)]
        id: Option<String>,
    },
    #[serde(rename = "#microsoft.graph.phoneAuthenticationMethod")]
    Phone {
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "phoneNumber")]
        phone_number: Option<String>,
    },
    #[serde(rename = "#microsoft.graph.microsoftAuthenticatorAuthenticationMethod")]
    AuthenticatorApp {
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "displayName")]
        display_name: Option<String>,
    },
    #[serde(rename = "#microsoft.graph.windowsHelloForBusinessAuthenticationMethod")]
    PlatformPasskey {
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "displayName")]
        display_name: Option<String>,
    },
    #[serde(rename = "#microsoft.graph.emailAuthenticationMethod")]
    Email {
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "emailAddress")]
        email_address: Option<String>,
    },
    #[serde(rename = "#microsoft.graph.temporaryAccessPassAuthenticationMethod")]
    TemporaryAccessPass {
        #[serde(default)]
        id: Option<String>,
    },
    #[serde(rename = "#microsoft.graph.softwareOathAuthenticationMethod")]
    SoftwareOath {
        #[serde(default)]
        id: Option<String>,
    },
    /// Any discriminant this client does not recognise.
    #[serde(other)]
    Unknown,
}

impl AuthenticationMethod {
    pub fn is_fido2_security_key(&self) -> bool {
        matches!(self, AuthenticationMethod::Fido2SecurityKey { .. })
    }
}

/// A single non-compliant user as emitted to the console table and the CSV
/// export. Field renames define the CSV header names.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportRow {
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    #[serde(rename = "UserPrincipalName")]
    pub user_principal_name: String,
    #[serde(rename = "ID")]
    pub id: Uuid,
}

impl From<&UserIdentity> for ReportRow {
    fn from(user: &UserIdentity) -> Self {
        ReportRow {
            display_name: user.display_name.clone(),
            user_principal_name: user.user_principal_name.clone(),
            id: user.id,
        }
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}",
            self.display_name, self.user_principal_name, self.id
        )
    }
}

/// Error body returned by the directory on non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
