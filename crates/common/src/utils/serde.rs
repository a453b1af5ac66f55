//! Serde helpers for durations expressed as milliseconds.
//!
//! Configuration files spell every duration as an integer `*_ms` key; these
//! modules plug into `#[serde(with = "...")]` to map them onto `Duration`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// `Duration` <-> integer milliseconds.
///
/// ```rust
/// use std::time::Duration;
///
/// use provider_mailgun_common::duration_millis;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Http {
///     #[serde(rename = "timeout_ms", with = "duration_millis")]
///     timeout: Duration,
/// }
/// ```
pub mod duration_millis {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize as milliseconds, saturating at `u64::MAX`.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    /// Deserialize milliseconds into a `Duration`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// `Option<Duration>` <-> optional integer milliseconds.
///
/// Pair with `#[serde(default)]` so a missing key reads as `None`.
pub mod option_duration_millis {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// `None` is written as null.
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => super::duration_millis::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Null or a missing key reads as `None`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct HttpSection {
        #[serde(rename = "timeout_ms", with = "duration_millis")]
        timeout: Duration,
        #[serde(rename = "pool_idle_timeout_ms", default, with = "option_duration_millis")]
        pool_idle_timeout: Option<Duration>,
    }

    /// Validates that durations are written as integer milliseconds.
    ///
    /// Assertions:
    /// - The rendered JSON carries `"timeout_ms":1500`.
    #[test]
    fn test_duration_millis_serialize() {
        let section =
            HttpSection { timeout: Duration::from_millis(1500), pool_idle_timeout: None };

        let json = serde_json::to_string(&section).expect("serialize");
        assert!(json.contains("\"timeout_ms\":1500"), "got {json}");
        assert!(json.contains("\"pool_idle_timeout_ms\":null"), "got {json}");
    }

    /// Validates that a missing optional key reads back as `None`.
    #[test]
    fn test_option_duration_millis_missing_key() {
        let section: HttpSection =
            serde_json::from_str(r#"{"timeout_ms":30000}"#).expect("deserialize");

        assert_eq!(section.timeout, Duration::from_secs(30));
        assert_eq!(section.pool_idle_timeout, None);
    }

    #[test]
    fn test_option_duration_millis_present() {
        let section: HttpSection =
            serde_json::from_str(r#"{"timeout_ms":0,"pool_idle_timeout_ms":90000}"#)
                .expect("deserialize");

        assert_eq!(section.timeout, Duration::ZERO);
        assert_eq!(section.pool_idle_timeout, Some(Duration::from_secs(90)));
    }

    /// Validates that non-numeric durations are rejected.
    ///
    /// Assertions:
    /// - Deserialization fails for a string value.
    #[test]
    fn test_duration_millis_rejects_string() {
        let result: Result<HttpSection, _> = serde_json::from_str(r#"{"timeout_ms":"30s"}"#);
        assert!(result.is_err());
    }
}
