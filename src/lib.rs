//! Client for the rate limit section of the Ceph RadosGW admin ops API.
//!
//! ```no_run
//! # async fn demo() -> rgw_ratelimit::Result<()> {
//! use rgw_ratelimit::{AdminClient, Config, RateLimitSpec};
//!
//! let client = AdminClient::new(Config::new("http://127.0.0.1:8080", "access", "secret"))?;
//! client
//!     .set_bucket_rate_limit(RateLimitSpec {
//!         bucket: Some("photos".into()),
//!         max_read_bytes: Some(1024),
//!         ..Default::default()
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
pub mod sign;

pub use config::Config;
pub use error::{Error, Result};
pub use http::AdminClient;
pub use ratelimit::{RateLimitParam, RateLimitScope, RateLimitSpec};
