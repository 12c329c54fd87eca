//! Cache key builders for the standard queries.
//!
//! Every key is a pure function of the request identity, so two requests
//! for the same data always share one cache entry and one in-flight fetch.

use flightbox::CacheKey;

/// Key for the list of hubs: `hubs_list`.
pub fn hubs() -> CacheKey {
    CacheKey::from("hubs_list")
}

/// Key for a single hub: `hub_{hub_id}`.
pub fn hub(hub_id: &str) -> CacheKey {
    CacheKey::new("hub", [hub_id])
}

/// Key for the projects of a hub: `projects_{hub_id}_{filter}`.
///
/// A missing filter is keyed as an empty one.
pub fn projects(hub_id: &str, filter: Option<&str>) -> CacheKey {
    CacheKey::new("projects", [hub_id, filter.unwrap_or_default()])
}

/// Key for a single project: `project_{hub_id}_{project_id}`.
pub fn project(hub_id: &str, project_id: &str) -> CacheKey {
    CacheKey::new("project", [hub_id, project_id])
}

/// Key for the element groups of a model: `elementGroups_{project_id}_{model_urn}`.
pub fn element_groups(project_id: &str, model_urn: &str) -> CacheKey {
    CacheKey::new("elementGroups", [project_id, model_urn])
}
