use std::fmt::{self, Formatter};

/// How many times an expectation must and may be invoked.
///
/// `max` of `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    min: usize,
    max: Option<usize>,
}

impl Cardinality {
    pub fn exactly(count: usize) -> Self {
        Cardinality {
            min: count,
            max: Some(count),
        }
    }

    pub fn at_least(count: usize) -> Self {
        Cardinality {
            min: count,
            max: None,
        }
    }

    pub fn at_most(count: usize) -> Self {
        Cardinality {
            min: 0,
            max: Some(count),
        }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Cardinality {
            min,
            max: Some(max),
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Whether `count` invocations are enough and not too many.
    pub fn is_satisfied(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    /// Whether one more invocation is allowed after `count`.
    pub fn allows_more(&self, count: usize) -> bool {
        self.max.map_or(true, |max| count < max)
    }

    /// How many more invocations are required after `count`.
    pub fn remaining(&self, count: usize) -> usize {
        self.min.saturating_sub(count)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, Some(0)) => f.write_str("never"),
            (0, None) => f.write_str("allowed"),
            (1, Some(1)) => f.write_str("expected once"),
            (min, Some(max)) if min == max => write!(f, "expected exactly {} times", min),
            (1, None) => f.write_str("expected at least once"),
            (min, None) => write!(f, "expected at least {} times", min),
            (0, Some(1)) => f.write_str("allowed at most once"),
            (0, Some(max)) => write!(f, "allowed at most {} times", max),
            (min, Some(max)) => write!(f, "expected between {} and {} times", min, max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_itself() {
        assert_eq!(Cardinality::exactly(1).to_string(), "expected once");
        assert_eq!(Cardinality::exactly(0).to_string(), "never");
        assert_eq!(Cardinality::at_least(0).to_string(), "allowed");
        assert_eq!(Cardinality::exactly(3).to_string(), "expected exactly 3 times");
        assert_eq!(Cardinality::at_least(2).to_string(), "expected at least 2 times");
        assert_eq!(Cardinality::at_most(4).to_string(), "allowed at most 4 times");
        assert_eq!(
            Cardinality::between(2, 5).to_string(),
            "expected between 2 and 5 times"
        );
    }

    #[test]
    fn unbounded_always_allows_more() {
        let allowing = Cardinality::at_least(0);
        assert!(allowing.allows_more(usize::MAX - 1));
        assert!(allowing.is_satisfied(0));
        assert_eq!(allowing.remaining(0), 0);
    }

    #[test]
    fn exhausts_at_max() {
        let twice = Cardinality::exactly(2);
        assert!(twice.allows_more(1));
        assert!(!twice.allows_more(2));
        assert!(!twice.is_satisfied(1));
        assert!(twice.is_satisfied(2));
        assert_eq!(twice.remaining(1), 1);
    }
}
