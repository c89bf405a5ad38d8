//! Errors reported while constructing patches, caches and
//! intersector options. Intersection itself never fails: degenerate
//! cases are misses.

// others
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubdivError {
    #[error("vertex valence {valence} is not supported (need at least {min})")]
    InvalidValence { valence: usize, min: usize },
    #[error("one-ring of valence {valence} needs {expected} neighbours, got {got}")]
    RingSize {
        valence: usize,
        expected: usize,
        got: usize,
    },
    #[error("subdivision level {level} exceeds the maximum of {max}")]
    SubdivLevelTooLarge { level: u32, max: u32 },
    #[error("cache needs at least one set and one way (got {sets} sets, {ways} ways)")]
    EmptyCache { sets: usize, ways: usize },
    #[error("unknown traversal strategy {0:?}")]
    UnknownStrategy(String),
    #[error("malformed parameter {0:?} (expected key=value)")]
    Parameter(String),
}

pub type Result<T> = std::result::Result<T, SubdivError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let e = SubdivError::InvalidValence { valence: 2, min: 3 };
        assert_eq!(
            e.to_string(),
            "vertex valence 2 is not supported (need at least 3)"
        );
        let e = SubdivError::UnknownStrategy("bfs".to_string());
        assert!(e.to_string().contains("\"bfs\""));
    }
}
