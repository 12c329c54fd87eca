//! Tests for cache key builders.

use flightbox_graphql::keys;

#[test]
fn test_key_formats() {
    assert_eq!(keys::hubs().as_str(), "hubs_list");
    assert_eq!(keys::hub("b.1").as_str(), "hub_b.1");
    assert_eq!(keys::project("b.1", "b.2").as_str(), "project_b.1_b.2");
    assert_eq!(
        keys::element_groups("b.2", "urn:adsk:model").as_str(),
        "elementGroups_b.2_urn:adsk:model"
    );
}

#[test]
fn test_projects_key_without_filter() {
    assert_eq!(keys::projects("b.1", None).as_str(), "projects_b.1_");
    assert_eq!(keys::projects("b.1", Some("rvt")).as_str(), "projects_b.1_rvt");
    assert_ne!(keys::projects("b.1", None), keys::projects("b.1", Some("rvt")));
}
