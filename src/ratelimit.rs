//! User, bucket and global rate limits on the `/ratelimit` admin endpoint.
//!
//! Every operation sends an explicit whitelist of fields, so a partial update
//! only touches what the caller filled in.

use crate::error::{Error, Result};
use crate::http::AdminClient;
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const RATELIMIT_PATH: &str = "/ratelimit";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitScope {
    User,
    Bucket,
    Global,
    Anon,
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::User => "user",
            RateLimitScope::Bucket => "bucket",
            RateLimitScope::Global => "global",
            RateLimitScope::Anon => "anon",
        }
    }

    /// Human wording used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            RateLimitScope::Anon => "anonymous",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RateLimitScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(RateLimitScope::User),
            "bucket" => Ok(RateLimitScope::Bucket),
            "global" => Ok(RateLimitScope::Global),
            "anon" => Ok(RateLimitScope::Anon),
            other => Err(format!("unknown rate limit scope: {}", other)),
        }
    }
}

/// Gateways and other clients send `""` for an unset scope. An empty or
/// unrecognised scope reads as `None` instead of failing the response.
fn deserialize_scope<'de, D>(d: D) -> std::result::Result<Option<RateLimitScope>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Rate limit settings for a user, a bucket, or the whole gateway.
///
/// `None` means "not specified" and is never put on the wire; `Some(0)` and
/// `Some(false)` are sent as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
    /// Overwritten by every operation before the request goes out.
    #[serde(
        rename = "ratelimit-scope",
        default,
        deserialize_with = "deserialize_scope"
    )]
    pub scope: Option<RateLimitScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "max-read-bytes", default, skip_serializing_if = "Option::is_none")]
    pub max_read_bytes: Option<i64>,
    #[serde(rename = "max-write-bytes", default, skip_serializing_if = "Option::is_none")]
    pub max_write_bytes: Option<i64>,
    #[serde(rename = "max-read-ops", default, skip_serializing_if = "Option::is_none")]
    pub max_read_ops: Option<i64>,
    #[serde(rename = "max-write-ops", default, skip_serializing_if = "Option::is_none")]
    pub max_write_ops: Option<i64>,
}

/// One field of [`RateLimitSpec`] as it appears in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitParam {
    Uid,
    Bucket,
    Global,
    Scope,
    Enabled,
    MaxReadBytes,
    MaxWriteBytes,
    MaxReadOps,
    MaxWriteOps,
}

impl RateLimitParam {
    pub fn wire_name(&self) -> &'static str {
        match self {
            RateLimitParam::Uid => "uid",
            RateLimitParam::Bucket => "bucket",
            RateLimitParam::Global => "global",
            RateLimitParam::Scope => "ratelimit-scope",
            RateLimitParam::Enabled => "enabled",
            RateLimitParam::MaxReadBytes => "max-read-bytes",
            RateLimitParam::MaxWriteBytes => "max-write-bytes",
            RateLimitParam::MaxReadOps => "max-read-ops",
            RateLimitParam::MaxWriteOps => "max-write-ops",
        }
    }
}

use RateLimitParam::*;

pub const GET_USER_PARAMS: &[RateLimitParam] = &[Uid, Scope];
pub const SET_USER_PARAMS: &[RateLimitParam] = &[
    Uid,
    Scope,
    Enabled,
    MaxReadBytes,
    MaxWriteBytes,
    MaxReadOps,
    MaxWriteOps,
];
pub const GET_BUCKET_PARAMS: &[RateLimitParam] = &[Bucket, Scope];
pub const SET_BUCKET_PARAMS: &[RateLimitParam] = &[
    Bucket,
    Scope,
    Enabled,
    MaxReadBytes,
    MaxWriteBytes,
    MaxReadOps,
    MaxWriteOps,
];
pub const GET_GLOBAL_PARAMS: &[RateLimitParam] = &[Global];
pub const SET_GLOBAL_PARAMS: &[RateLimitParam] = &[
    Global,
    Scope,
    Enabled,
    MaxReadBytes,
    MaxWriteBytes,
    MaxReadOps,
    MaxWriteOps,
];

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|v| !v.is_empty())
}

impl RateLimitSpec {
    fn param_value(&self, param: RateLimitParam) -> Option<String> {
        match param {
            Uid => non_empty(&self.uid).map(str::to_string),
            Bucket => non_empty(&self.bucket).map(str::to_string),
            Global => self.global.map(|b| b.to_string()),
            Scope => self.scope.map(|s| s.as_str().to_string()),
            Enabled => self.enabled.map(|b| b.to_string()),
            MaxReadBytes => self.max_read_bytes.map(|v| v.to_string()),
            MaxWriteBytes => self.max_write_bytes.map(|v| v.to_string()),
            MaxReadOps => self.max_read_ops.map(|v| v.to_string()),
            MaxWriteOps => self.max_write_ops.map(|v| v.to_string()),
        }
    }

    /// Query parameters for exactly the listed fields, in list order. Unset
    /// fields are left out.
    pub fn to_params(&self, whitelist: &[RateLimitParam]) -> Vec<(&'static str, String)> {
        whitelist
            .iter()
            .filter_map(|p| self.param_value(*p).map(|v| (p.wire_name(), v)))
            .collect()
    }

    fn require_uid(&self) -> Result<()> {
        non_empty(&self.uid).map(|_| ()).ok_or(Error::MissingUserId)
    }

    fn require_bucket(&self) -> Result<()> {
        non_empty(&self.bucket)
            .map(|_| ())
            .ok_or(Error::MissingBucket)
    }

    fn require_global(&self, scope: RateLimitScope) -> Result<()> {
        if self.global == Some(true) {
            Ok(())
        } else {
            Err(Error::GlobalRequired(scope))
        }
    }

    fn with_scope(mut self, scope: RateLimitScope) -> Self {
        self.scope = Some(scope);
        self
    }
}

pub fn decode_spec(body: &[u8]) -> Result<RateLimitSpec> {
    serde_json::from_slice(body).map_err(|source| Error::Decode {
        body: String::from_utf8_lossy(body).into_owned(),
        source,
    })
}

impl AdminClient {
    async fn get_rate_limit(&self, params: &[(&str, String)]) -> Result<RateLimitSpec> {
        let body = self.call(Method::GET, RATELIMIT_PATH, params).await?;
        decode_spec(&body)
    }

    async fn set_rate_limit(&self, params: &[(&str, String)]) -> Result<()> {
        self.call(Method::POST, RATELIMIT_PATH, params).await?;
        Ok(())
    }

    /// Rate limit of one user. `uid` must be set.
    pub async fn get_user_rate_limit(&self, spec: RateLimitSpec) -> Result<RateLimitSpec> {
        spec.require_uid()?;
        let spec = spec.with_scope(RateLimitScope::User);
        self.get_rate_limit(&spec.to_params(GET_USER_PARAMS)).await
    }

    pub async fn set_user_rate_limit(&self, spec: RateLimitSpec) -> Result<()> {
        spec.require_uid()?;
        let spec = spec.with_scope(RateLimitScope::User);
        self.set_rate_limit(&spec.to_params(SET_USER_PARAMS)).await
    }

    /// Rate limit of one bucket. `bucket` must be set.
    pub async fn get_bucket_rate_limit(&self, spec: RateLimitSpec) -> Result<RateLimitSpec> {
        spec.require_bucket()?;
        let spec = spec.with_scope(RateLimitScope::Bucket);
        self.get_rate_limit(&spec.to_params(GET_BUCKET_PARAMS)).await
    }

    pub async fn set_bucket_rate_limit(&self, spec: RateLimitSpec) -> Result<()> {
        spec.require_bucket()?;
        let spec = spec.with_scope(RateLimitScope::Bucket);
        self.set_rate_limit(&spec.to_params(SET_BUCKET_PARAMS)).await
    }

    pub async fn get_global_rate_limit(&self) -> Result<RateLimitSpec> {
        let spec = RateLimitSpec {
            global: Some(true),
            scope: Some(RateLimitScope::Global),
            ..Default::default()
        };
        self.get_rate_limit(&spec.to_params(GET_GLOBAL_PARAMS)).await
    }

    /// Default limit for every user. Requires `global: Some(true)`.
    pub async fn set_global_user_rate_limit(&self, spec: RateLimitSpec) -> Result<()> {
        self.set_global_rate_limit(spec, RateLimitScope::User).await
    }

    /// Default limit for every bucket. Requires `global: Some(true)`.
    pub async fn set_global_bucket_rate_limit(&self, spec: RateLimitSpec) -> Result<()> {
        self.set_global_rate_limit(spec, RateLimitScope::Bucket).await
    }

    /// Limit for unauthenticated requests. Requires `global: Some(true)`.
    pub async fn set_global_anonymous_rate_limit(&self, spec: RateLimitSpec) -> Result<()> {
        self.set_global_rate_limit(spec, RateLimitScope::Anon).await
    }

    async fn set_global_rate_limit(
        &self,
        spec: RateLimitSpec,
        scope: RateLimitScope,
    ) -> Result<()> {
        spec.require_global(scope)?;
        let spec = spec.with_scope(scope);
        self.set_rate_limit(&spec.to_params(SET_GLOBAL_PARAMS)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_spec() -> RateLimitSpec {
        RateLimitSpec {
            uid: Some("alice".into()),
            bucket: Some("b1".into()),
            global: Some(true),
            scope: Some(RateLimitScope::Anon),
            enabled: Some(false),
            max_read_bytes: Some(1024),
            max_write_bytes: Some(2048),
            max_read_ops: Some(0),
            max_write_ops: Some(20),
        }
    }

    fn names(params: &[(&'static str, String)]) -> Vec<&'static str> {
        params.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn set_user_whitelist_drops_bucket_and_global() {
        let spec = full_spec().with_scope(RateLimitScope::User);
        let params = spec.to_params(SET_USER_PARAMS);
        assert_eq!(
            names(&params),
            vec![
                "uid",
                "ratelimit-scope",
                "enabled",
                "max-read-bytes",
                "max-write-bytes",
                "max-read-ops",
                "max-write-ops"
            ]
        );
        assert!(params.contains(&("ratelimit-scope", "user".to_string())));
        assert!(params.contains(&("enabled", "false".to_string())));
        assert!(params.contains(&("max-read-ops", "0".to_string())));
    }

    #[test]
    fn get_whitelists_send_identity_only() {
        let spec = full_spec().with_scope(RateLimitScope::Bucket);
        assert_eq!(
            spec.to_params(GET_BUCKET_PARAMS),
            vec![
                ("bucket", "b1".to_string()),
                ("ratelimit-scope", "bucket".to_string())
            ]
        );
        assert_eq!(
            full_spec().to_params(GET_GLOBAL_PARAMS),
            vec![("global", "true".to_string())]
        );
    }

    #[test]
    fn unset_fields_are_omitted() {
        let spec = RateLimitSpec {
            bucket: Some("b1".into()),
            max_read_bytes: Some(1024),
            ..Default::default()
        }
        .with_scope(RateLimitScope::Bucket);
        assert_eq!(
            spec.to_params(SET_BUCKET_PARAMS),
            vec![
                ("bucket", "b1".to_string()),
                ("ratelimit-scope", "bucket".to_string()),
                ("max-read-bytes", "1024".to_string())
            ]
        );
    }

    #[test]
    fn empty_identifiers_fail_validation() {
        let spec = RateLimitSpec {
            uid: Some(String::new()),
            bucket: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(spec.require_uid(), Err(Error::MissingUserId)));
        assert!(matches!(spec.require_bucket(), Err(Error::MissingBucket)));
        assert!(RateLimitSpec::default().require_uid().is_err());
    }

    #[test]
    fn global_flag_must_be_true() {
        let mut spec = RateLimitSpec::default();
        assert!(spec.require_global(RateLimitScope::User).is_err());
        spec.global = Some(false);
        let err = spec.require_global(RateLimitScope::Bucket).unwrap_err();
        assert_eq!(
            err.to_string(),
            "global must be true for global bucket rate limit"
        );
        spec.global = Some(true);
        assert!(spec.require_global(RateLimitScope::Anon).is_ok());
    }

    #[test]
    fn decode_uses_wire_names() {
        let body = br#"{"bucket":"b1","ratelimit-scope":"bucket","enabled":true,"max-read-bytes":1024,"max-write-bytes":2048}"#;
        let spec = decode_spec(body).unwrap();
        assert_eq!(spec.bucket.as_deref(), Some("b1"));
        assert_eq!(spec.scope, Some(RateLimitScope::Bucket));
        assert_eq!(spec.enabled, Some(true));
        assert_eq!(spec.max_read_bytes, Some(1024));
        assert_eq!(spec.max_write_bytes, Some(2048));
        assert_eq!(spec.max_read_ops, None);
    }

    #[test]
    fn decode_tolerates_empty_or_unknown_scope() {
        let spec = decode_spec(br#"{"ratelimit-scope":"","max-read-ops":1}"#).unwrap();
        assert_eq!(spec.scope, None);
        assert_eq!(spec.max_read_ops, Some(1));

        let spec = decode_spec(br#"{"ratelimit-scope":"tenant","max-write-ops":2}"#).unwrap();
        assert_eq!(spec.scope, None);
        assert_eq!(spec.max_write_ops, Some(2));

        let spec = decode_spec(br#"{"ratelimit-scope":null}"#).unwrap();
        assert_eq!(spec.scope, None);
        let spec = decode_spec(br#"{"ratelimit-scope":"anon"}"#).unwrap();
        assert_eq!(spec.scope, Some(RateLimitScope::Anon));
    }

    #[test]
    fn decode_error_carries_body() {
        let err = decode_spec(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        let msg = err.to_string();
        assert!(msg.starts_with("failed to unmarshal radosgw http response."));
        assert!(msg.contains("<html>oops</html>"));
    }

    #[test]
    fn serialize_always_writes_scope() {
        let v = serde_json::to_value(RateLimitSpec {
            uid: Some("alice".into()),
            max_write_ops: Some(5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            v,
            serde_json::json!({"uid":"alice","ratelimit-scope":null,"max-write-ops":5})
        );
    }

    #[test]
    fn scope_parse_and_describe() {
        assert_eq!("anon".parse::<RateLimitScope>(), Ok(RateLimitScope::Anon));
        assert!("everyone".parse::<RateLimitScope>().is_err());
        assert_eq!(RateLimitScope::Anon.describe(), "anonymous");
        assert_eq!(RateLimitScope::User.to_string(), "user");
    }
}
