//! Permission sets as carried in session claims.
//!
//! # Purpose
//! Wraps the flat list of dot-separated permission strings a principal holds
//! and answers grant questions against it.
//!
//! # How it fits
//! Route guards and UI visibility checks build a [`PermissionSet`] from the
//! session's claim payload once per request and query it many times.
//!
//! # Key invariants
//! - Checks never fail: absent, empty, or malformed input evaluates to `false`.
//! - Strings are compared as-is; no trimming, case folding, or wildcards.
use serde::{Deserialize, Serialize};

use crate::rules::grants;

/// An unordered collection of held permission strings.
///
/// Duplicates are harmless; the set is a thin wrapper over the claim list as
/// delivered by the permission-source provider.
///
/// ```rust
/// use ember_authz::PermissionSet;
///
/// let held = PermissionSet::from_iter(["admin.site"]);
/// assert!(held.has_permission("admin.site.messages"));
/// assert!(!held.has_permission("admin.users"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(Vec<String>);

impl PermissionSet {
    /// Build a set from raw claim strings.
    pub fn new(permissions: Vec<String>) -> Self {
        Self(permissions)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether the set satisfies a single required permission under the
    /// hierarchy rules (exact match, ancestor grants descendant, descendant
    /// implies ancestor).
    pub fn has_permission(&self, required: &str) -> bool {
        self.has_any_permission(&[required])
    }

    /// Whether the set satisfies any of the given alternatives (OR semantics).
    ///
    /// An empty set or empty alternative list evaluates to `false`.
    pub fn has_any_permission(&self, alternatives: &[&str]) -> bool {
        if self.0.is_empty() {
            return false;
        }
        alternatives
            .iter()
            .any(|required| self.0.iter().any(|held| grants(held, required)))
    }

    /// Whether any held permission manages `feature` in *some* scope, i.e.
    /// ends with `".{feature}"`. Used when the scope prefix is unknown.
    pub fn has_any_feature(&self, feature: &str) -> bool {
        if feature.is_empty() {
            return false;
        }
        self.0.iter().any(|held| {
            held.ends_with(feature)
                && held[..held.len() - feature.len()].ends_with('.')
        })
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Shortcut admin check that deliberately skips the hierarchy walk.
///
/// True iff the session role is exactly `"admin"` or the set holds the exact
/// literal `"admin"`. Cheap enough for hot paths where rule-based domination
/// is not wanted.
pub fn is_admin(role: Option<&str>, held: &PermissionSet) -> bool {
    role == Some("admin") || held.iter().any(|p| p == "admin")
}
