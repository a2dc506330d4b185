//! User-Agent strings for harvester traffic.
//!
//! The tool identifies itself by default; [`BROWSER_USER_AGENT`] is only sent
//! as a one-off retry when a blog answers 403 to the identifying agent.

/// Product comment identifying what the traffic is for.
const UA_COMMENT: &str = "blog-text-harvester";

/// Browser User-Agent used as fallback when servers return 403.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for every harvester request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("blog-harvester/{version} ({UA_COMMENT})")
}
