use crate::error::{CuratorError, CuratorResult};

/// An opaque caller-supplied boolean expression (e.g. `id = 5`), combined
/// verbatim into a WHERE clause.
///
/// The engine does not parse or sanitize this text: it is trusted caller
/// input by contract, exactly like the system it administers. The only
/// rejected input is the empty string, which would otherwise silently turn
/// a targeted mutation into a full-table one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predicate(String);

impl Predicate {
    /// Wraps a raw boolean expression. Fails with a validation error when
    /// the expression is empty or blank.
    pub fn new(raw: impl Into<String>) -> CuratorResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CuratorError::Validation(
                "predicate must not be empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// The raw expression, spliced as-is after `WHERE`.
    pub fn as_sql(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_should_keep_raw_expression_verbatim() {
        let predicate = Predicate::new("id = 5 AND status = 'open'").unwrap();
        assert_eq!(predicate.as_sql(), "id = 5 AND status = 'open'");
    }

    #[test]
    fn test_should_reject_empty_predicate() {
        assert!(Predicate::new("").is_err());
        assert!(Predicate::new("   ").is_err());
    }
}
