//! Domain webhooks.

use serde::{Deserialize, Serialize};

use super::enums::WebhookKind;
use super::{require, FormPairs};
use crate::errors::{ApiError, ApiResult};

/// Desired webhook for one event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookParameters {
    pub domain: String,
    pub kind: WebhookKind,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl WebhookParameters {
    /// Reject values the API would refuse.
    pub fn validate(&self) -> ApiResult<()> {
        require("domain", &self.domain)?;
        if self.urls.is_empty() {
            return Err(ApiError::invalid_request("urls must not be empty"));
        }
        if self.urls.len() > 3 {
            return Err(ApiError::invalid_request("at most 3 urls per webhook"));
        }
        Ok(())
    }

    /// Create body: the event kind goes in `id`, each URL repeats `url`.
    pub fn create_form(&self) -> FormPairs {
        let mut form = vec![("id", self.kind.as_str().to_owned())];
        form.extend(self.update_form());
        form
    }

    /// Form pairs for an update.
    pub fn update_form(&self) -> FormPairs {
        self.urls.iter().map(|u| ("url", u.clone())).collect()
    }
}

/// Webhook as the API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookObservation {
    pub domain: String,
    pub kind: WebhookKind,
    pub urls: Vec<String>,
}

/// `{"webhook": {"urls": [...]}}`; older responses carry a single `url`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub webhook: WebhookUrls,
}

/// `{"webhook": {"urls": [...]}}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookUrls {
    urls: Vec<String>,
    url: Option<String>,
}

impl WebhookEnvelope {
    /// Attach the domain and kind the URLs belong to.
    pub fn into_observation(self, domain: &str, kind: WebhookKind) -> WebhookObservation {
        let WebhookUrls { mut urls, url } = self.webhook;
        if let Some(url) = url {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        WebhookObservation { domain: domain.to_owned(), kind, urls }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(urls: &[&str]) -> WebhookParameters {
        WebhookParameters {
            domain: "mg.example.com".into(),
            kind: WebhookKind::PermanentFail,
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_create_form_sends_kind_as_id() {
        let form = params(&["https://a.io/hook", "https://b.io/hook"]).create_form();
        assert_eq!(form[0], ("id", "permanent_fail".to_string()));
        assert_eq!(form.len(), 3);
        assert!(form[1..].iter().all(|(k, _)| *k == "url"));
    }

    #[test]
    fn test_validation_bounds_url_count() {
        assert!(params(&[]).validate().is_err());
        assert!(params(&["1", "2", "3", "4"]).validate().is_err());
        assert!(params(&["https://a.io"]).validate().is_ok());
    }

    #[test]
    fn test_envelope_merges_legacy_url() {
        let body = r#"{"webhook": {"url": "https://a.io/hook"}}"#;
        let observed = serde_json::from_str::<WebhookEnvelope>(body)
            .expect("decode")
            .into_observation("mg.example.com", WebhookKind::Opened);
        assert_eq!(observed.urls, vec!["https://a.io/hook".to_string()]);
        assert_eq!(observed.kind, WebhookKind::Opened);
    }
}
