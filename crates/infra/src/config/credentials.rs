//! Connection secret parsing.
//!
//! A connection secret holds a small JSON document:
//!
//! ```json
//! {"apiKey": "key-...", "region": "eu", "baseUrl": "https://api.eu.mailgun.net"}
//! ```
//!
//! `region` and `baseUrl` are optional. Keys are also accepted in
//! snake_case.

use provider_mailgun_common::{CommonError, CommonResult};
use provider_mailgun_domain::Region;
use serde::Deserialize;

use super::schema::ApiConfig;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretDocument {
    #[serde(alias = "api_key")]
    api_key: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default, alias = "base_url")]
    base_url: Option<String>,
}

/// Credentials extracted from a connection secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_key: String,
    pub region: Option<Region>,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiCredentials {
    /// Parse the secret document.
    ///
    /// # Errors
    /// Returns [`CommonError::Serialization`] for malformed JSON and
    /// [`CommonError::Config`] for an empty key or unknown region.
    pub fn from_json(raw: &[u8]) -> CommonResult<Self> {
        let doc: SecretDocument = serde_json::from_slice(raw)
            .map_err(|e| CommonError::serialization_format("json", e.to_string()))?;

        if doc.api_key.trim().is_empty() {
            return Err(CommonError::config_field("apiKey", "must not be empty"));
        }
        let region = match doc.region.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<Region>().map_err(|e| CommonError::config_field("region", e))?,
            ),
        };
        let base_url = doc.base_url.filter(|url| !url.trim().is_empty());

        Ok(Self { api_key: doc.api_key, region, base_url })
    }

    /// Overlay these credentials on an API section; unset fields are kept.
    pub fn apply_to(&self, api: &mut ApiConfig) {
        api.api_key = self.api_key.clone();
        if let Some(region) = self.region {
            api.region = region;
        }
        if let Some(url) = &self.base_url {
            api.base_url = Some(url.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_document() {
        let creds =
            ApiCredentials::from_json(br#"{"apiKey":"key-1","region":"EU","baseUrl":"http://x"}"#)
                .unwrap();
        assert_eq!(creds.api_key, "key-1");
        assert_eq!(creds.region, Some(Region::Eu));
        assert_eq!(creds.base_url.as_deref(), Some("http://x"));
    }

    #[test]
    fn test_snake_case_and_optional_fields() {
        let creds = ApiCredentials::from_json(br#"{"api_key":"key-2","base_url":""}"#).unwrap();
        assert_eq!(creds.region, None);
        assert_eq!(creds.base_url, None);
        assert!(!format!("{creds:?}").contains("key-2"));
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(ApiCredentials::from_json(b"not json").is_err());
        assert!(ApiCredentials::from_json(br#"{"apiKey":"  "}"#).is_err());
        let err = ApiCredentials::from_json(br#"{"apiKey":"k","region":"apac"}"#).unwrap_err();
        assert!(err.to_string().contains("region"), "{err}");
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut api = ApiConfig { region: Region::Eu, ..ApiConfig::default() };
        let creds = ApiCredentials { api_key: "k".into(), region: None, base_url: None };
        creds.apply_to(&mut api);
        assert_eq!(api.api_key, "k");
        assert_eq!(api.region, Region::Eu);
        assert_eq!(api.base_url, None);
    }
}
