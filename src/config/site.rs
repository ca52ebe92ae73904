//! `[site]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[site]` section in folio.toml - site-wide metadata passed to listing pages.
///
/// # Example
/// ```toml
/// [site]
/// title = "Development Blog"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteInfo {
    /// Site title, used as the fallback title of listing pages.
    #[serde(default = "defaults::site::title")]
    #[educe(Default = defaults::site::title())]
    pub title: String,
}
