//! SMTP credentials of a sending domain.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{require, FormPairs};
use crate::errors::ApiResult;

/// Desired SMTP credential.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpCredentialParameters {
    pub domain: String,
    /// Local part or full address.
    pub login: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl fmt::Debug for SmtpCredentialParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentialParameters")
            .field("domain", &self.domain)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SmtpCredentialParameters {
    /// Reject values the API would refuse.
    pub fn validate(&self) -> ApiResult<()> {
        require("domain", &self.domain)?;
        require("login", &self.login)?;
        require("password", &self.password)
    }

    /// `login@domain`, unless the login already is an address.
    pub fn full_login(&self) -> String {
        qualify_login(&self.login, &self.domain)
    }

    /// Form pairs for creation.
    pub fn create_form(&self) -> FormPairs {
        vec![("login", self.login.clone()), ("password", self.password.clone())]
    }

    /// Form pairs for a password change.
    pub fn password_form(&self) -> FormPairs {
        vec![("password", self.password.clone())]
    }
}

/// Qualify a bare local part with `domain`.
pub fn qualify_login(login: &str, domain: &str) -> String {
    if login.contains('@') {
        login.to_owned()
    } else {
        format!("{login}@{domain}")
    }
}

/// SMTP credential as listed by the API; passwords are never returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpCredentialObservation {
    pub login: String,
    pub mailbox: Option<String>,
    pub size_bytes: Option<u64>,
    pub created_at: Option<String>,
}

/// Page returned by the credential listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SmtpCredentialList {
    pub items: Vec<SmtpCredentialObservation>,
    pub total_count: u64,
}

impl SmtpCredentialList {
    /// Find a credential by local part or full address.
    pub fn find(self, domain: &str, login: &str) -> Option<SmtpCredentialObservation> {
        let wanted = qualify_login(login, domain).to_lowercase();
        self.items
            .into_iter()
            .find(|item| qualify_login(&item.login, domain).to_lowercase() == wanted)
    }
}
