//! Closed vocabularies used by the API.

use serde::{Deserialize, Serialize};

use crate::impl_wire_enum;

/// API region; selects the default base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl_wire_enum!(Region {
    Us => "us",
    Eu => "eu",
});

impl Region {
    /// API endpoint for the region.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Us => "https://api.mailgun.net",
            Self::Eu => "https://api.eu.mailgun.net",
        }
    }
}

/// What the API does with messages flagged as spam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamAction {
    Disabled,
    Block,
    Tag,
}

impl_wire_enum!(SpamAction {
    Disabled => "disabled",
    Block => "block",
    Tag => "tag",
});

/// Scheme used for tracking links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebScheme {
    Http,
    Https,
}

impl_wire_enum!(WebScheme {
    Http => "http",
    Https => "https",
});

/// DKIM key length in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DkimKeySize {
    #[serde(rename = "1024")]
    Bits1024,
    #[serde(rename = "2048")]
    Bits2048,
}

impl_wire_enum!(DkimKeySize {
    Bits1024 => "1024",
    Bits2048 => "2048",
});

/// Who may post to a mailing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    ReadOnly,
    Members,
    Everyone,
}

impl_wire_enum!(AccessLevel {
    ReadOnly => "readonly",
    Members => "members",
    Everyone => "everyone",
});

/// Where replies to list mail go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyPreference {
    List,
    Sender,
}

impl_wire_enum!(ReplyPreference {
    List => "list",
    Sender => "sender",
});

/// Event a domain webhook fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookKind {
    Accepted,
    Clicked,
    Complained,
    Delivered,
    Opened,
    PermanentFail,
    TemporaryFail,
    Unsubscribed,
}

impl_wire_enum!(WebhookKind {
    Accepted => "accepted",
    Clicked => "clicked",
    Complained => "complained",
    Delivered => "delivered",
    Opened => "opened",
    PermanentFail => "permanent_fail",
    TemporaryFail => "temporary_fail",
    Unsubscribed => "unsubscribed",
});

/// The nine managed resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Domain,
    Route,
    MailingList,
    Webhook,
    SmtpCredential,
    Template,
    Bounce,
    Complaint,
    Unsubscribe,
}

impl_wire_enum!(ResourceKind {
    Domain => "domain",
    Route => "route",
    MailingList => "mailinglist",
    Webhook => "webhook",
    SmtpCredential => "smtpcredential",
    Template => "template",
    Bounce => "bounce",
    Complaint => "complaint",
    Unsubscribe => "unsubscribe",
});

impl ResourceKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 9] = [
        Self::Domain,
        Self::Route,
        Self::MailingList,
        Self::Webhook,
        Self::SmtpCredential,
        Self::Template,
        Self::Bounce,
        Self::Complaint,
        Self::Unsubscribe,
    ];

    /// Whether identifiers of this kind are scoped to a sending domain.
    pub fn is_domain_scoped(self) -> bool {
        !matches!(self, Self::Domain | Self::Route | Self::MailingList)
    }
}
