use serde::{Deserialize, Serialize};

/// A referencing table blocking a safe delete, with how many rows depend on
/// the targeted rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub table: String,
    pub count: i64,
}

/// Outcome of a dependency-checked delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SafeDeleteOutcome {
    /// No dependents existed; the rows were deleted.
    Deleted { affected: u64 },
    /// Dependents exist; nothing was mutated. The full list is returned so
    /// the caller can decide to re-invoke with cascade semantics.
    Blocked { dependencies: Vec<Dependency> },
}

impl SafeDeleteOutcome {
    /// Whether the delete went through.
    pub fn is_deleted(&self) -> bool {
        matches!(self, SafeDeleteOutcome::Deleted { .. })
    }
}
