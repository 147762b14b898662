//! Hierarchical permission checking shared by ember services.
//!
//! # Purpose
//! Decides whether a principal's held permission strings satisfy a required
//! permission using dot-separated hierarchy semantics: an ancestor grants its
//! descendants, and a held descendant satisfies a check for its ancestor.
//!
//! # How it fits
//! Every route guard and UI visibility decision calls into this crate with
//! the permission list taken from the session's signed claims. Token parsing
//! itself lives with the caller; this crate treats the list as opaque input.
//!
//! # Key invariants
//! - Checks never fail or panic: empty or malformed input evaluates to `false`.
//! - No wildcard syntax, case folding, or trimming; strings compare as-is.
//! - The root permission `admin` dominates its whole `admin.*` branch purely
//!   through the ancestor rule, not through special-casing.
//!
//! # Examples
//! ```rust
//! use ember_authz::PermissionSet;
//!
//! let held = PermissionSet::from_iter(["admin.community.bcyca"]);
//! assert!(held.has_permission("admin.community.bcyca.events"));
//! assert!(!held.has_permission("admin.community.mondrook"));
//! ```
//!
//! # Common pitfalls
//! - The descendant-implies-ancestor rule is deliberately over-permissive:
//!   holding any `admin.*` string satisfies a bare `admin` check. Use
//!   [`is_admin`] where only the literal should count.

mod rules;
mod set;

pub use rules::{ancestor_grants, descendant_implies, exact_match, grants};
pub use set::{PermissionSet, is_admin};
