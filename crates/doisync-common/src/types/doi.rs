//! The DOI value type

use crate::error::{DoisyncError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Resolver base used when rendering a DOI as a URL.
pub const DOI_ORG_URL: &str = "https://doi.org/";

/// Accepts bare names, `doi:` URNs and doi.org resolver URLs.
static DOI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:doi:|https?://(?:dx\.)?doi\.org/)?(10\.\d+(?:\.\d+)*)/(\S.*?)\s*$")
        .unwrap_or_else(|e| unreachable!("static DOI pattern must compile: {e}"))
});

/// A Digital Object Identifier made of a prefix and a suffix.
///
/// DOI names are case-insensitive, so both parts are stored lowercased and
/// equality and hashing operate on the normalised value.
///
/// # Examples
///
/// ```
/// use doisync_common::types::Doi;
///
/// let doi: Doi = "https://doi.org/10.15468/DL.ABC123".parse().unwrap();
/// assert_eq!(doi.prefix(), "10.15468");
/// assert_eq!(doi.suffix(), "dl.abc123");
/// assert_eq!(doi.to_string(), "10.15468/dl.abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi {
    prefix: String,
    suffix: String,
}

impl Doi {
    /// Build a DOI from its two parts.
    pub fn new(prefix: impl AsRef<str>, suffix: impl AsRef<str>) -> Result<Self> {
        let prefix = prefix.as_ref().trim();
        let suffix = suffix.as_ref().trim();

        if !prefix.starts_with("10.") {
            return Err(DoisyncError::InvalidDoi(format!(
                "prefix '{}' must begin with '10.'",
                prefix
            )));
        }
        if suffix.is_empty() {
            return Err(DoisyncError::InvalidDoi(format!(
                "suffix missing for prefix '{}'",
                prefix
            )));
        }

        Ok(Self {
            prefix: prefix.to_lowercase(),
            suffix: suffix.to_lowercase(),
        })
    }

    /// Whether `value` can be parsed into a DOI.
    pub fn is_parsable(value: &str) -> bool {
        DOI_PATTERN.is_match(value)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The DOI name, e.g. `10.15468/dl.abc123`.
    pub fn doi_name(&self) -> String {
        format!("{}/{}", self.prefix, self.suffix)
    }

    /// The resolvable doi.org URL.
    pub fn url(&self) -> String {
        format!("{}{}", DOI_ORG_URL, self.doi_name())
    }
}

impl FromStr for Doi {
    type Err = DoisyncError;

    fn from_str(s: &str) -> Result<Self> {
        let captures = DOI_PATTERN
            .captures(s)
            .ok_or_else(|| DoisyncError::InvalidDoi(s.to_string()))?;

        Doi::new(&captures[1], &captures[2])
    }
}

impl TryFrom<String> for Doi {
    type Error = DoisyncError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Doi> for String {
    fn from(doi: Doi) -> Self {
        doi.doi_name()
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.suffix)
    }
}
