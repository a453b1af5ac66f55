//! Inbound routes.

use serde::{Deserialize, Serialize};

use super::de::null_default;
use super::{require, FormPairs};
use crate::errors::{ApiError, ApiResult};

/// Desired route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteParameters {
    pub priority: i32,
    pub description: String,
    pub expression: String,
    pub actions: Vec<String>,
}

impl RouteParameters {
    /// Reject values the API would refuse.
    pub fn validate(&self) -> ApiResult<()> {
        require("expression", &self.expression)?;
        if self.actions.is_empty() {
            return Err(ApiError::invalid_request("actions must not be empty"));
        }
        Ok(())
    }

    /// Form body for create and update; each action repeats the `action` key.
    pub fn form(&self) -> FormPairs {
        let mut form = vec![
            ("priority", self.priority.to_string()),
            ("description", self.description.clone()),
            ("expression", self.expression.clone()),
        ];
        form.extend(self.actions.iter().map(|a| ("action", a.clone())));
        form
    }
}

/// Route as the API reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteObservation {
    pub id: String,
    pub priority: i32,
    pub description: String,
    pub expression: String,
    #[serde(deserialize_with = "null_default")]
    pub actions: Vec<String>,
    pub created_at: Option<String>,
}

/// `{"route": {...}}` wrapper returned by create and get.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteEnvelope {
    pub route: RouteObservation,
}
