//! Redirect-URL and platform candidates for the login-URL request
//!
//! The provider compares `redirect_url` and `platform` byte for byte against
//! the values registered for the client and answers error code `407` on any
//! difference. The exact registered spelling is not always known, so the
//! login flow submits a fixed, ordered list of spellings until one is
//! accepted.
//!
//! Everything here is pure string manipulation. The list is built by
//! [`resolve_candidates`]; [`candidates_for`] substitutes an explicitly
//! configured list when one is present.

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;

/// One guess at the provider's registered redirect URL and platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVariation {
    /// Human-readable name used in logs and error diagnostics
    pub label: String,
    /// Value sent as `redirect_url`
    pub redirect_url: String,
    /// Value sent as `platform`
    pub platform: String,
}

impl CandidateVariation {
    /// Creates a candidate from its three parts.
    pub fn new(
        label: impl Into<String>,
        redirect_url: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            redirect_url: redirect_url.into(),
            platform: platform.into(),
        }
    }
}

/// Builds the ordered candidate list for a registered URL and platform.
///
/// The order is fixed:
///
/// 1. URL with a trailing slash, platform as given
/// 2. URL without a trailing slash, platform as given
/// 3. each platform word capitalized
/// 4. the first `" x "` separator upper-cased
/// 5. the first `" x "` separator replaced with `_`
///
/// Entries 3 to 5 all use the trailing-slash URL.
///
/// # Examples
///
/// ```
/// use ssobridge::provider::variations::resolve_candidates;
///
/// let candidates = resolve_candidates("https://magnum.id", "magnum x lawless");
/// assert_eq!(candidates.len(), 5);
/// assert_eq!(candidates[0].redirect_url, "https://magnum.id/");
/// assert_eq!(candidates[1].redirect_url, "https://magnum.id");
/// assert_eq!(candidates[2].platform, "Magnum X Lawless");
/// assert_eq!(candidates[3].platform, "magnum X lawless");
/// assert_eq!(candidates[4].platform, "magnum_lawless");
/// ```
pub fn resolve_candidates(base_url: &str, base_platform: &str) -> Vec<CandidateVariation> {
    let with_slash = with_trailing_slash(base_url);
    let without_slash = base_url.strip_suffix('/').unwrap_or(base_url);

    vec![
        CandidateVariation::new(
            "Primary (with trailing slash)",
            with_slash.clone(),
            base_platform,
        ),
        CandidateVariation::new("Without trailing slash", without_slash, base_platform),
        CandidateVariation::new(
            "Platform: Capitalized",
            with_slash.clone(),
            capitalize_words(base_platform),
        ),
        CandidateVariation::new(
            "Platform: All caps X",
            with_slash.clone(),
            base_platform.replacen(" x ", " X ", 1),
        ),
        CandidateVariation::new(
            "Platform: Underscore",
            with_slash,
            base_platform.replacen(" x ", "_", 1),
        ),
    ]
}

/// Returns the candidates to try for the given provider configuration.
///
/// A non-empty `candidates` list in the configuration is used verbatim;
/// otherwise the list is generated from `redirect_url` and `platform`.
pub fn candidates_for(config: &ProviderConfig) -> Vec<CandidateVariation> {
    if config.candidates.is_empty() {
        resolve_candidates(&config.redirect_url, &config.platform)
    } else {
        config.candidates.clone()
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

fn capitalize_words(platform: &str) -> String {
    platform
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
