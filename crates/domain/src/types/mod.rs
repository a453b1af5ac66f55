//! Resource parameter and observation types.
//!
//! Parameters render the `application/x-www-form-urlencoded` pairs the API
//! expects; list-valued fields repeat their key. Observations decode the
//! JSON the API returns and tolerate missing fields.

pub mod domain;
pub mod enums;
pub mod mailing_list;
pub mod route;
pub mod smtp_credential;
pub mod suppression;
pub mod template;
pub mod webhook;

pub use domain::{DnsRecord, DomainEnvelope, DomainObservation, DomainParameters};
pub use enums::{
    AccessLevel, DkimKeySize, Region, ReplyPreference, ResourceKind, SpamAction, WebScheme,
    WebhookKind,
};
pub use mailing_list::{MailingListEnvelope, MailingListObservation, MailingListParameters};
pub use route::{RouteEnvelope, RouteObservation, RouteParameters};
pub use smtp_credential::{
    qualify_login, SmtpCredentialList, SmtpCredentialObservation, SmtpCredentialParameters,
};
pub use suppression::{
    BounceObservation, BounceParameters, ComplaintObservation, ComplaintParameters,
    UnsubscribeObservation, UnsubscribeParameters, UNSUBSCRIBE_ALL_TAG,
};
pub use template::{TemplateEnvelope, TemplateObservation, TemplateParameters, TemplateVersion};
pub use webhook::{WebhookEnvelope, WebhookObservation, WebhookParameters};

use crate::errors::{ApiError, ApiResult};

/// Form body as ordered key/value pairs.
pub type FormPairs = Vec<(&'static str, String)>;

/// Reject an empty required field.
pub(crate) fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid_request(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn push_opt<T: ToString>(form: &mut FormPairs, key: &'static str, value: Option<&T>) {
    if let Some(value) = value {
        form.push((key, value.to_string()));
    }
}

/// Serde helpers for loosely typed API fields.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    /// Accept `"550"` and `550` alike.
    pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }))
    }

    /// Treat `null` as the type's default.
    pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
