//! Sending domains.

use serde::{Deserialize, Serialize};

use super::de::null_default;
use super::enums::{DkimKeySize, SpamAction, WebScheme};
use super::{push_opt, require, FormPairs};
use crate::errors::ApiResult;

/// Desired state of a sending domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainParameters {
    pub name: String,
    pub spam_action: Option<SpamAction>,
    pub wildcard: Option<bool>,
    pub force_dkim_authority: Option<bool>,
    pub dkim_key_size: Option<DkimKeySize>,
    pub ips: Vec<String>,
    pub web_scheme: Option<WebScheme>,
    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,
}

impl DomainParameters {
    /// Parameters with API defaults for everything but the name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Reject values the API would refuse.
    pub fn validate(&self) -> ApiResult<()> {
        require("name", &self.name)
    }

    /// Form body for `POST /v4/domains`.
    pub fn create_form(&self) -> FormPairs {
        let mut form = vec![("name", self.name.clone())];
        push_opt(&mut form, "spam_action", self.spam_action.as_ref());
        if let Some(wildcard) = self.wildcard {
            form.push(("wildcard", wildcard.to_string()));
        }
        if let Some(force) = self.force_dkim_authority {
            form.push(("force_dkim_authority", force.to_string()));
        }
        push_opt(&mut form, "dkim_key_size", self.dkim_key_size.as_ref());
        if !self.ips.is_empty() {
            form.push(("ips", self.ips.join(",")));
        }
        push_opt(&mut form, "web_scheme", self.web_scheme.as_ref());
        push_opt(&mut form, "smtp_password", self.smtp_password.as_ref());
        form
    }

    /// Form body for `PUT /v4/domains/{name}`; only mutable fields.
    pub fn update_form(&self) -> FormPairs {
        let mut form = FormPairs::new();
        push_opt(&mut form, "spam_action", self.spam_action.as_ref());
        if let Some(wildcard) = self.wildcard {
            form.push(("wildcard", wildcard.to_string()));
        }
        push_opt(&mut form, "web_scheme", self.web_scheme.as_ref());
        form
    }
}

/// DNS record the API asks the owner to publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsRecord {
    pub record_type: String,
    pub name: Option<String>,
    pub value: String,
    pub priority: Option<String>,
    pub valid: Option<String>,
}

/// Remote state of a sending domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainObservation {
    pub name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub domain_type: String,
    pub smtp_login: String,
    pub spam_action: Option<SpamAction>,
    pub wildcard: bool,
    pub web_scheme: Option<WebScheme>,
    pub is_disabled: bool,
    pub created_at: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub receiving_dns_records: Vec<DnsRecord>,
    #[serde(deserialize_with = "null_default")]
    pub sending_dns_records: Vec<DnsRecord>,
}

/// Response body of create and get; DNS records sit beside the domain.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainEnvelope {
    pub domain: DomainObservation,
    #[serde(default, deserialize_with = "null_default")]
    pub receiving_dns_records: Vec<DnsRecord>,
    #[serde(default, deserialize_with = "null_default")]
    pub sending_dns_records: Vec<DnsRecord>,
}

impl DomainEnvelope {
    /// Fold the envelope's DNS records into the domain.
    pub fn into_observation(self) -> DomainObservation {
        DomainObservation {
            receiving_dns_records: self.receiving_dns_records,
            sending_dns_records: self.sending_dns_records,
            ..self.domain
        }
    }
}
