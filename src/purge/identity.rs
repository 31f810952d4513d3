//! Identity-alias expansion.
//!
//! Store records may carry any of a student's identifiers in any casing,
//! so every deletion matches the three identifier spaces in original,
//! upper, and lower case.

use super::request::DeletionRequest;

/// Expand a deletion request into the full set of account-name aliases to
/// match: the three identifiers in original order, then all-uppercase,
/// then all-lowercase. Always 9 entries; duplicates are tolerated.
///
/// Case transforms apply to the whole string.
pub fn expand_aliases(request: &DeletionRequest) -> Vec<String> {
    let originals = [
        request.student_id.as_str(),
        request.vle_id.as_str(),
        request.shib_id.as_str(),
    ];

    let mut aliases = Vec::with_capacity(originals.len() * 3);
    aliases.extend(originals.iter().map(|id| id.to_string()));
    aliases.extend(originals.iter().map(|id| id.to_uppercase()));
    aliases.extend(originals.iter().map(|id| id.to_lowercase()));
    aliases
}
