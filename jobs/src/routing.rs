//! Region routing for quota-bound stages. Dataplex has no `global` queue
//! region; globally scoped resources share the `us-central1` bucket.

use std::collections::BTreeSet;

pub const GLOBAL_FALLBACK_REGION: &str = "us-central1";

pub fn message_region(location: &str) -> &str {
    if location == "global" {
        GLOBAL_FALLBACK_REGION
    } else {
        location
    }
}

/// Distinct queue regions for a set of resource locations, deterministic
/// order.
pub fn queue_regions<'a>(locations: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    locations
        .into_iter()
        .map(|location| message_region(location).to_string())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}
