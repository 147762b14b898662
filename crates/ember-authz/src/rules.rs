//! The three comparison rules behind hierarchical permission checks, kept as
//! named predicates so each can be tested in isolation.

/// Exact string equality; segments are case-sensitive and never trimmed.
pub fn exact_match(held: &str, required: &str) -> bool {
    held == required
}

/// A held ancestor grants every descendant: holding `admin.site` satisfies a
/// check for `admin.site.messages`.
pub fn ancestor_grants(held: &str, required: &str) -> bool {
    required.len() > held.len()
        && required.as_bytes().get(held.len()) == Some(&b'.')
        && required.starts_with(held)
}

/// A held descendant satisfies a check for its ancestor: holding
/// `admin.site.messages` satisfies a check for `admin.site`.
///
/// This direction is unusual but relied on by existing call sites. It also
/// means any held `admin.*` string satisfies a bare `admin` check; that is the
/// observed behavior and is kept as-is.
pub fn descendant_implies(held: &str, required: &str) -> bool {
    held.len() > required.len()
        && held.as_bytes().get(required.len()) == Some(&b'.')
        && held.starts_with(required)
}

/// Whether a single held permission satisfies a single required permission
/// under any of the three rules.
pub fn grants(held: &str, required: &str) -> bool {
    exact_match(held, required)
        || ancestor_grants(held, required)
        || descendant_implies(held, required)
}
