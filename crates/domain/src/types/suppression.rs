//! Suppression lists: bounces, complaints and unsubscribes.
//!
//! Creating an entry that already exists overwrites it, so updates re-post
//! the create form.

use serde::{Deserialize, Serialize};

use super::de::{null_default, string_or_number};
use super::{push_opt, require, FormPairs};
use crate::errors::ApiResult;

/// Tag meaning "unsubscribed from everything".
pub const UNSUBSCRIBE_ALL_TAG: &str = "*";

/// Desired bounce entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceParameters {
    pub domain: String,
    pub address: String,
    pub code: Option<u16>,
    pub error: Option<String>,
}

impl BounceParameters {
    /// Reject values the API would refuse.
    pub fn validate(&self) -> ApiResult<()> {
        require("domain", &self.domain)?;
        require("address", &self.address)
    }

    /// Create form pairs.
    pub fn form(&self) -> FormPairs {
        let mut form = vec![("address", self.address.clone())];
        push_opt(&mut form, "code", self.code.as_ref());
        push_opt(&mut form, "error", self.error.as_ref());
        form
    }
}

/// Bounce entry as the API reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceObservation {
    pub address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub code: Option<String>,
    pub error: Option<String>,
    pub created_at: Option<String>,
}

/// Desired complaint entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplaintParameters {
    pub domain: String,
    pub address: String,
}

impl ComplaintParameters {
    pub fn validate(&self) -> ApiResult<()> {
        require("domain", &self.domain)?;
        require("address", &self.address)
    }

    pub fn form(&self) -> FormPairs {
        vec![("address", self.address.clone())]
    }
}

/// Complaint entry as the API reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplaintObservation {
    pub address: String,
    pub created_at: Option<String>,
}

/// Desired unsubscribe entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsubscribeParameters {
    pub domain: String,
    pub address: String,
    pub tags: Vec<String>,
}

impl UnsubscribeParameters {
    pub fn validate(&self) -> ApiResult<()> {
        require("domain", &self.domain)?;
        require("address", &self.address)
    }

    /// Tags in effect; none means every tag.
    pub fn effective_tags(&self) -> Vec<String> {
        if self.tags.is_empty() {
            vec![UNSUBSCRIBE_ALL_TAG.to_owned()]
        } else {
            self.tags.clone()
        }
    }

    pub fn form(&self) -> FormPairs {
        let mut form = vec![("address", self.address.clone())];
        form.extend(self.effective_tags().into_iter().map(|t| ("tag", t)));
        form
    }
}

/// Unsubscribe entry as the API reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsubscribeObservation {
    pub address: String,
    #[serde(deserialize_with = "null_default")]
    pub tags: Vec<String>,
    pub created_at: Option<String>,
}
