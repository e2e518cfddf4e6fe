//! Configuration provenance: who asserted a fact, and with what authority.
//!
//! Every mutable fact in the metadata graph carries the source that last set
//! it. A writer may only overwrite a fact whose current source is no higher
//! than its own, which is what lets hand-written configuration permanently
//! override inference without rules fighting the caller on every event.

use serde::Serialize;

/// Authority level of a configured fact, lowest to highest.
///
/// The derived `Ord` is the precedence lattice: `Convention <
/// DataAnnotation < Explicit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ConfigurationSource {
    /// Inferred by a convention rule.
    Convention,
    /// Declared by a single-purpose marker rule.
    DataAnnotation,
    /// Explicitly configured by the caller.
    Explicit,
}

impl ConfigurationSource {
    /// Whether a writer with this source may overwrite a fact currently
    /// attributed to `other`. An unset fact (`None`) can always be written;
    /// equal authority may supersede itself.
    pub fn overrides(self, other: Option<ConfigurationSource>) -> bool {
        match other {
            None => true,
            Some(existing) => self >= existing,
        }
    }

    /// Combine with an existing source, keeping the higher authority.
    pub fn max_with(self, other: Option<ConfigurationSource>) -> ConfigurationSource {
        match other {
            Some(existing) if existing > self => existing,
            _ => self,
        }
    }
}
