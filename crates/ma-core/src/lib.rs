//! Core types for Magic Areas
//!
//! This crate holds the identifiers shared by every other crate in the
//! workspace: entity ids and their domains, area types and states, the
//! feature catalogue, and the option keys stored in config entries.

mod area;
pub mod conf;
pub mod domains;
mod entity_id;
mod feature;

pub use area::{AreaState, AreaType, SecondaryState, BUILTIN_AREA_STATES};
pub use entity_id::{split_domain, EntityId, EntityIdError};
pub use feature::{
    ConfigurableFeature, Feature, FeatureParseError, FEATURE_LIST, FEATURE_LIST_GLOBAL,
    FEATURE_LIST_META, NON_CONFIGURABLE_FEATURES_META,
};

/// Integration domain used for config entries
pub const DOMAIN: &str = "magic_areas";

/// Name of the meta area that aggregates every other area
pub const META_AREA_GLOBAL: &str = "Global";

/// Name of the meta area that aggregates interior areas
pub const META_AREA_INTERIOR: &str = "Interior";

/// Name of the meta area that aggregates exterior areas
pub const META_AREA_EXTERIOR: &str = "Exterior";

/// All meta area names, in creation order
pub const META_AREAS: [&str; 3] = [META_AREA_GLOBAL, META_AREA_INTERIOR, META_AREA_EXTERIOR];

/// Turn an area name into its id ("Living Room" -> "living_room")
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Kitchen"), "kitchen");
        assert_eq!(slugify("Living Room"), "living_room");
        assert_eq!(slugify("  Kid's  Bedroom "), "kid_s_bedroom");
        assert_eq!(slugify("GLOBAL"), "global");
    }

    #[test]
    fn test_global_slug_matches_meta_name() {
        assert_eq!(slugify(META_AREA_GLOBAL), "global");
    }
}
