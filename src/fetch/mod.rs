//! Page fetching with a shared timeout, user-agent and politeness policy.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::fetch::{ClientSettings, PageClient};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PageClient::new(ClientSettings::default())?;
//! let page = client.get(&Url::parse("https://blog.example.com/")?).await?;
//! println!("{} bytes from {}", page.body.len(), page.url);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod rate_limiter;

pub use client::{
    ClientSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
    FetchedPage, PageClient,
};
pub use error::FetchError;
pub use rate_limiter::{RateLimiter, extract_domain};
