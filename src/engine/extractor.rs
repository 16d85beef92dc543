//! Breadcrumb extraction: pattern selection and depth measurement.

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::Depth;
use crate::utils::config::PipelineDefaults;

/// Single-line `<Topic r:id="...">` element; group 1 is the breadcrumb.
pub const TOPIC_PATTERN: &str = r#"^\s*<Topic\s+r:id="([^"]*)">\s*$"#;

/// Which tag pattern a run matches against. Tags spanning several lines are never matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TagPattern {
    /// RDF topic element ([`TOPIC_PATTERN`]).
    #[default]
    Topic,
    /// User-supplied regex; capture group 1 is the breadcrumb.
    Custom(String),
}

impl TagPattern {
    /// Regex source for this pattern.
    pub fn source(&self) -> &str {
        match self {
            TagPattern::Topic => TOPIC_PATTERN,
            TagPattern::Custom(src) => src,
        }
    }

    /// `None` or `"topic"` → [`TagPattern::Topic`]; anything else is a custom regex.
    pub fn from_option(s: Option<&str>) -> Self {
        match s {
            None | Some("topic") => TagPattern::Topic,
            Some(src) => TagPattern::Custom(src.to_string()),
        }
    }
}

/// Compiled pattern plus the separator used to measure depth. Cheap to clone (regex internals are shared).
#[derive(Clone, Debug)]
pub struct Extractor {
    regex: Regex,
    separator: String,
}

impl Extractor {
    /// Compile `pattern`. Fails on a bad regex, a regex with no capture group, or an empty separator.
    pub fn compile(pattern: &TagPattern, separator: Option<&str>) -> Result<Self> {
        let separator = separator.unwrap_or(PipelineDefaults::SEPARATOR);
        if separator.is_empty() {
            bail!("breadcrumb separator must not be empty");
        }
        let regex = Regex::new(pattern.source())
            .with_context(|| format!("compile tag pattern {:?}", pattern.source()))?;
        if regex.captures_len() < 2 {
            bail!(
                "tag pattern {:?} has no capture group for the breadcrumb",
                pattern.source()
            );
        }
        Ok(Self {
            regex,
            separator: separator.to_string(),
        })
    }

    /// Breadcrumb captured from `line`, or None when the line doesn't match.
    pub fn extract<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Depth of the breadcrumb on `line`, or None when the line doesn't match.
    pub fn depth(&self, line: &str) -> Option<Depth> {
        self.extract(line)
            .map(|crumb| breadcrumb_depth(crumb, &self.separator))
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

/// Number of `separator`-delimited segments in `crumb`. An empty crumb is one (empty) segment.
pub fn breadcrumb_depth(crumb: &str, separator: &str) -> Depth {
    Depth::try_from(crumb.split(separator).count()).unwrap_or(Depth::MAX)
}
