//! Structured diagnostics emitted by the discovery rules.
//!
//! The core never formats human-readable strings for these findings; it
//! hands the host a structured event naming the offending types and
//! members, and the host decides how to log or surface them.

use std::cell::RefCell;

use crate::classifier::ScalarType;

/// One ambiguity, conflict, or redundant-structure finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelDiagnostic {
    /// A relationship candidate group had more than one viable pairing;
    /// nothing was bound.
    AmbiguousNavigations {
        first_type: String,
        second_type: String,
        /// Competing member names, forward side then inverse side.
        members: Vec<String>,
    },
    /// More than one property matched the primary-key naming heuristic.
    AmbiguousKeyCandidates {
        entity_type: String,
        candidates: Vec<String>,
    },
    /// A name-matched foreign key property has the wrong type; discovery
    /// stopped for that foreign key instead of guessing further.
    IncompatibleForeignKeyProperty {
        dependent: String,
        principal: String,
        property: String,
        expected: ScalarType,
        actual: ScalarType,
    },
    /// A shadow property was synthesized because no structural member fit.
    ShadowPropertyCreated {
        entity_type: String,
        property: String,
    },
    /// A convention index was removed because a key or index now covers it.
    RedundantIndexRemoved {
        entity_type: String,
        properties: Vec<String>,
    },
    /// A join entity type was synthesized for a many-to-many relationship.
    JoinEntityCreated {
        name: String,
        left: String,
        right: String,
    },
    /// Conflicting property markers were resolved by splitting one
    /// relationship into two.
    RelationshipSplit {
        dependent: String,
        principal: String,
    },
}

/// Receiver for structured diagnostics.
///
/// Uses `&self` so sinks can be shared between the build session and the
/// host that wants to read them afterwards.
pub trait DiagnosticsSink {
    fn report(&self, diagnostic: ModelDiagnostic);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn report(&self, _diagnostic: ModelDiagnostic) {}
}

/// Collects diagnostics for later inspection. The default sink in tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: RefCell<Vec<ModelDiagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ModelDiagnostic> {
        self.events.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&self, diagnostic: ModelDiagnostic) {
        self.events.borrow_mut().push(diagnostic);
    }
}
