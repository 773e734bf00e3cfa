use crate::config::Config;
use crate::error::{Error, Result};
use crate::sign::{self, Credentials, SigningParams};
use log::{debug, warn};
use reqwest::header::{HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Error body RadosGW sends with non-2xx answers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StatusErrorBody {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
    #[serde(rename = "HostId", default)]
    pub host_id: Option<String>,
}

/// Authenticated client for the RadosGW admin ops API.
///
/// Cheap to clone; clones share the underlying connection pool. Every call is
/// a single round trip, nothing is retried.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    base: Url,
    admin_prefix: String,
    region: String,
    creds: Credentials,
}

/// A client that cannot be built is a setup problem, not a failed request.
fn client_build_error(e: reqwest::Error) -> Error {
    Error::Config(format!("failed to build http client: {}", e))
}

pub fn build_client(cfg: &Config) -> Result<Client> {
    let ua = HeaderValue::from_str(&cfg.user_agent)
        .unwrap_or_else(|_| HeaderValue::from_static("rgw-ratelimit"));
    let mut default_headers = reqwest::header::HeaderMap::new();
    default_headers.insert(USER_AGENT, ua);
    Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
        .map_err(client_build_error)
}

pub fn map_status_to_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        StatusCode::TOO_MANY_REQUESTS => "rate_limited",
        s if s.is_server_error() => "upstream_error",
        _ => "server_error",
    }
}

/// Turns a non-2xx answer into [`Error::Api`], preferring the gateway's own
/// error code over the generic status mapping.
pub fn status_error(status: StatusCode, body: &[u8]) -> Error {
    let text = String::from_utf8_lossy(body).into_owned();
    let code = serde_json::from_slice::<StatusErrorBody>(body)
        .ok()
        .map(|b| b.code)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| map_status_to_code(status).to_string());
    Error::Api {
        status,
        code,
        message: text,
    }
}

impl AdminClient {
    pub fn new(cfg: Config) -> Result<Self> {
        if cfg.endpoint.is_empty() {
            return Err(Error::Config("endpoint not set".into()));
        }
        if cfg.access_key.is_empty() {
            return Err(Error::Config("access key not set".into()));
        }
        if cfg.secret_key.is_empty() {
            return Err(Error::Config("secret key not set".into()));
        }
        let base = Url::parse(&cfg.endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint {}: {}", cfg.endpoint, e)))?;
        if base.host_str().is_none() {
            return Err(Error::Config(format!(
                "invalid endpoint {}: missing host",
                cfg.endpoint
            )));
        }
        let client = build_client(&cfg)?;
        let admin_prefix = format!("/{}", cfg.admin_prefix.trim_matches('/'));
        Ok(Self {
            client,
            base,
            admin_prefix,
            region: cfg.region,
            creds: Credentials {
                access_key: cfg.access_key,
                secret_key: cfg.secret_key,
            },
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env().map_err(Error::Config)?)
    }

    fn full_path(&self, path: &str) -> String {
        let base_path = self.base.path().trim_end_matches('/');
        let prefix = self.admin_prefix.trim_end_matches('/');
        format!("{}{}/{}", base_path, prefix, path.trim_start_matches('/'))
    }

    fn host_header(&self) -> String {
        let host = self.base.host_str().unwrap_or_default();
        match self.base.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Issues one signed admin request and returns the response body.
    ///
    /// `params` become the query string; `format=json` is always added.
    /// Dropping the returned future aborts the request.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<u8>> {
        let mut query_params: Vec<(&str, String)> = params.to_vec();
        query_params.push(("format", "json".to_string()));
        let query = sign::canonical_query(&query_params);

        let full_path = self.full_path(path);
        let mut url = self.base.clone();
        url.set_path(&full_path);
        url.set_query(Some(&query));

        let now = chrono::Utc::now();
        let amz_date = sign::amz_date(&now);
        let payload_hash = sign::sha256_hex(b"");
        let signed_headers = [
            ("host", self.host_header()),
            ("x-amz-content-sha256", payload_hash.clone()),
            ("x-amz-date", amz_date.clone()),
        ];
        let authorization = sign::authorization(
            &self.creds,
            &SigningParams {
                region: &self.region,
                service: sign::SERVICE,
                datetime: now,
            },
            method.as_str(),
            &sign::canonical_uri(&full_path),
            &query,
            &signed_headers,
            &payload_hash,
        );

        debug!("RGW {} {}", method, full_path);
        let res = self
            .client
            .request(method.clone(), url)
            .header(AUTHORIZATION, authorization)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .send()
            .await
            .map_err(|e| {
                warn!("RGW {} {} error sending request: {}", method, full_path, e);
                Error::Transport(e)
            })?;

        let status = res.status();
        let body = res.bytes().await?.to_vec();
        debug!("RGW {} {} -> {}", method, full_path, status);
        if !status.is_success() {
            warn!("RGW {} {} failed with status {}", method, full_path, status);
            return Err(status_error(status, &body));
        }
        Ok(body)
    }
}
