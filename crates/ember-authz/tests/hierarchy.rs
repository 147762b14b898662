use ember_authz::{PermissionSet, is_admin};

#[test]
fn exact_match_grants() {
    let held = PermissionSet::from_iter(["admin.site"]);
    assert!(held.has_permission("admin.site"));
}

#[test]
fn ancestor_grants_descendant_and_back() {
    let held = PermissionSet::from_iter(["admin.site"]);
    assert!(held.has_permission("admin.site.messages"));

    let held = PermissionSet::from_iter(["admin.site.messages"]);
    assert!(held.has_permission("admin.site"));
}

#[test]
fn no_cross_branch_grant() {
    let held = PermissionSet::from_iter(["admin.users"]);
    assert!(!held.has_permission("admin.site.messages"));
}

#[test]
fn empty_set_always_denies() {
    let held = PermissionSet::default();
    assert!(!held.has_permission("admin"));
}

#[test]
fn alternatives_are_or_ed() {
    let held = PermissionSet::from_iter(["admin.users"]);
    assert!(held.has_any_permission(&["admin.site", "admin.users"]));
}

#[test]
fn root_admin_dominates_through_the_ancestor_rule() {
    let held = PermissionSet::from_iter(["admin"]);
    assert!(held.has_permission("admin.community.bcyca.events"));
    assert!(held.has_permission("admin.site.messages"));

    // A root only dominates its own branch.
    assert!(!held.has_permission("reports.generate"));
}

#[test]
fn community_scoped_scenario() {
    let held = PermissionSet::from_iter(["admin.community.bcyca"]);
    assert!(held.has_permission("admin.community.bcyca.events"));
    assert!(!held.has_permission("admin.community.mondrook"));

    // Known quirk of the descendant rule, kept deliberately: holding any
    // dotted descendant of `admin` satisfies a bare `admin` check.
    assert!(held.has_permission("admin"));

    // The literal-only shortcut does not share that quirk.
    assert!(!is_admin(None, &held));
    assert!(is_admin(Some("admin"), &held));
}

#[test]
fn duplicates_are_harmless() {
    let held = PermissionSet::from_iter(["admin.site", "admin.site"]);
    assert!(held.has_permission("admin.site"));
}
