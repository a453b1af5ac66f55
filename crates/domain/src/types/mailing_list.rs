//! Mailing lists.

use serde::{Deserialize, Serialize};

use super::enums::{AccessLevel, ReplyPreference};
use super::{push_opt, require, FormPairs};
use crate::errors::ApiResult;

/// Desired mailing list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailingListParameters {
    pub address: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub access_level: Option<AccessLevel>,
    pub reply_preference: Option<ReplyPreference>,
}

impl MailingListParameters {
    /// Reject values the API would refuse.
    pub fn validate(&self) -> ApiResult<()> {
        require("address", &self.address)
    }

    /// Create/update form pairs.
    pub fn form(&self) -> FormPairs {
        let mut form = vec![("address", self.address.clone())];
        push_opt(&mut form, "name", self.name.as_ref());
        push_opt(&mut form, "description", self.description.as_ref());
        push_opt(&mut form, "access_level", self.access_level.as_ref());
        push_opt(&mut form, "reply_preference", self.reply_preference.as_ref());
        form
    }
}

/// Mailing list as the API reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailingListObservation {
    pub address: String,
    pub name: String,
    pub description: String,
    pub access_level: Option<AccessLevel>,
    pub reply_preference: Option<ReplyPreference>,
    pub members_count: u64,
    pub created_at: Option<String>,
}

/// `{"list": ...}` response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct MailingListEnvelope {
    pub list: MailingListObservation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_and_decode() {
        let params = MailingListParameters {
            address: "dev@mg.example.com".into(),
            access_level: Some(AccessLevel::Members),
            ..MailingListParameters::default()
        };
        assert_eq!(
            params.form(),
            vec![
                ("address", "dev@mg.example.com".to_string()),
                ("access_level", "members".to_string()),
            ]
        );

        let body = r#"{"list": {"address": "dev@mg.example.com", "members_count": 4,
                        "access_level": "readonly", "reply_preference": "list"}}"#;
        let envelope: MailingListEnvelope = serde_json::from_str(body).expect("decode");
        assert_eq!(envelope.list.members_count, 4);
        assert_eq!(envelope.list.access_level, Some(AccessLevel::ReadOnly));
    }
}
