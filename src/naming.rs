//! Name heuristics shared by the discovery conventions.
//!
//! All comparisons are case-convention-insensitive: identifiers are
//! normalized to snake_case before comparing, so `BlogId`, `blogId` and
//! `blog_id` all match the candidate built from `Blog` + `Id`.

use inflector::Inflector;

/// Normalize an identifier for comparison.
pub fn normalize(identifier: &str) -> String {
    identifier.to_snake_case()
}

/// Whether two identifiers are the same modulo case convention.
pub fn names_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Whether `member` matches the concatenation of `base` and `suffix`
/// (e.g. member `blog_id` vs base `Blog`, suffix `Id`).
pub fn concat_match(member: &str, base: &str, suffix: &str) -> bool {
    normalize(member) == format!("{}_{}", normalize(base), normalize(suffix))
}

/// Whether a property name qualifies as a convention primary-key candidate
/// for the given entity type: `Id` or `[entity name]Id`, case-insensitively.
pub fn is_key_candidate(member: &str, entity_type: &str) -> bool {
    let normalized = normalize(member);
    normalized == "id" || normalized == format!("{}_id", normalize(entity_type))
}

/// Concatenate a base name and a principal key property name into a shadow
/// property name, preserving the model's casing (`Blog` + `Id` -> `BlogId`).
/// A key property that already repeats the base is not doubled
/// (`Blog` + `BlogId` -> `BlogId`).
pub fn shadow_property_name(base: &str, key_property: &str) -> String {
    if normalize(key_property).starts_with(&normalize(base)) {
        key_property.to_string()
    } else {
        format!("{}{}", base, key_property)
    }
}

/// Deterministic name for a synthesized many-to-many join entity type:
/// the two entity type names in lexicographic order, concatenated.
pub fn join_entity_name(left: &str, right: &str) -> String {
    if left <= right {
        format!("{}{}", left, right)
    } else {
        format!("{}{}", right, left)
    }
}

/// Append an ordinal to `name` until `taken` stops matching it.
pub fn uniquify(name: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }
    let mut ordinal = 1u32;
    loop {
        let candidate = format!("{}{}", name, ordinal);
        if !taken(&candidate) {
            return candidate;
        }
        ordinal += 1;
    }
}
