//! Stored message templates.

use serde::{Deserialize, Serialize};

use super::{push_opt, require, FormPairs};
use crate::errors::ApiResult;

/// Desired template with its initial version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateParameters {
    pub domain: String,
    pub name: String,
    pub description: Option<String>,
    /// Body of the initial version.
    pub template: String,
    pub engine: Option<String>,
    pub tag: Option<String>,
    pub comment: Option<String>,
}

impl TemplateParameters {
    /// Reject values the API would refuse.
    pub fn validate(&self) -> ApiResult<()> {
        require("domain", &self.domain)?;
        require("name", &self.name)?;
        require("template", &self.template)
    }

    /// Form pairs for creation.
    pub fn create_form(&self) -> FormPairs {
        let mut form = vec![("name", self.name.clone())];
        push_opt(&mut form, "description", self.description.as_ref());
        form.push(("template", self.template.clone()));
        push_opt(&mut form, "engine", self.engine.as_ref());
        push_opt(&mut form, "tag", self.tag.as_ref());
        push_opt(&mut form, "comment", self.comment.as_ref());
        form
    }

    /// Only the description is mutable on the template itself.
    pub fn update_form(&self) -> FormPairs {
        vec![("description", self.description.clone().unwrap_or_default())]
    }
}

/// One stored template version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateVersion {
    pub tag: String,
    pub template: String,
    pub engine: String,
    pub comment: String,
    pub active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Template as the API reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateObservation {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "createdBy")]
    pub created_by: Option<String>,
    pub version: Option<TemplateVersion>,
}

/// `{"template": ...}` response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateEnvelope {
    pub template: TemplateObservation,
}
