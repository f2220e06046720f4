//! Expanding a wildcard move into concrete moves.

use super::pattern::{compile, wildcard_count, PatternError};

/// A concrete move from one address to another. Neither side has wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoveOperation {
    /// Address to move from.
    pub source: String,
    /// Address to move to.
    pub destination: String,
}

impl MoveOperation {
    /// Create a new move operation.
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl std::fmt::Display for MoveOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Expand `source` against `listing` into concrete moves.
///
/// Without wildcards the result is exactly `[source -> destination]` and the
/// listing is not consulted. Otherwise every listing entry matching `source`
/// yields one move, in listing order, whose destination is `destination`
/// with `$1`, `$2`, ... (or `${1}`, ...) replaced by the captured segments.
/// A pattern matching nothing yields an empty vector.
///
/// A reference takes the longest run of letters, digits and `_` as the group
/// name, so `$1_new` names a group `1_new` and expands to nothing. Write
/// `${1}_new` when such a character follows.
pub fn expand(
    listing: &[String],
    source: &str,
    destination: &str,
) -> Result<Vec<MoveOperation>, PatternError> {
    if wildcard_count(source) == 0 {
        return Ok(vec![MoveOperation::new(source, destination)]);
    }

    let re = compile(source)?;
    // Newline never occurs in an address, so entries cannot run together.
    let haystack = listing.join("\n");

    let ops = re
        .captures_iter(&haystack)
        .filter_map(|caps| {
            let matched = caps.get(0)?;
            let mut dst = String::new();
            caps.expand(destination, &mut dst);
            Some(MoveOperation::new(matched.as_str(), dst))
        })
        .collect();

    Ok(ops)
}
