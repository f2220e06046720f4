//! Compiling wildcard addresses into regular expressions.

use regex::Regex;
use thiserror::Error;

/// The wildcard token.
pub const WILDCARD: char = '*';

/// Capture group substituted for each wildcard.
///
/// Structural separators of an address (`.`, `[`, `]`) and whitespace are
/// excluded so a wildcard stays inside one segment.
pub const WILDCARD_CAPTURE: &str = r"([^\]\[\t\n\v\f\r .]*)";

/// Errors raised while compiling an address pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The derived regular expression is invalid.
    #[error("could not make pattern out of {pattern} ({raw}): {source}")]
    Compile {
        /// The address pattern as written.
        pattern: String,
        /// The derived regular expression.
        raw: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Count the wildcards in an address pattern.
pub fn wildcard_count(pattern: &str) -> usize {
    pattern.matches(WILDCARD).count()
}

/// Derive the regular expression text for an address pattern.
///
/// Literal text is escaped; the expression matches whole lines only.
pub fn raw_pattern(pattern: &str) -> String {
    let body = pattern
        .split(WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(WILDCARD_CAPTURE);
    format!("(?m)^{}$", body)
}

/// Compile an address pattern into a regular expression.
///
/// The i-th capture group holds the segment matched by the i-th wildcard.
pub fn compile(pattern: &str) -> Result<Regex, PatternError> {
    let raw = raw_pattern(pattern);
    Regex::new(&raw).map_err(|source| PatternError::Compile {
        pattern: pattern.to_string(),
        raw,
        source,
    })
}
