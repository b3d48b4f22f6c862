use serde::{Deserialize, Serialize};

/// Transmitter tier. Higher tiers hold more and pull faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Basic,
    Advanced,
    Elite,
    Ultimate,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Basic, Tier::Advanced, Tier::Elite, Tier::Ultimate];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The tier one step up, if any.
    pub fn next(self) -> Option<Tier> {
        Tier::ALL.get(self.index() + 1).copied()
    }

    /// The tier one step down, if any.
    pub fn previous(self) -> Option<Tier> {
        self.index().checked_sub(1).map(|i| Tier::ALL[i])
    }

    /// True if `other` is exactly one step above or below.
    pub fn is_adjacent(self, other: Tier) -> bool {
        self.index().abs_diff(other.index()) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_and_previous_walk_the_ladder() {
        assert_eq!(Tier::Basic.next(), Some(Tier::Advanced));
        assert_eq!(Tier::Ultimate.next(), None);
        assert_eq!(Tier::Elite.previous(), Some(Tier::Advanced));
        assert_eq!(Tier::Basic.previous(), None);
    }

    #[test]
    fn adjacency() {
        assert!(Tier::Basic.is_adjacent(Tier::Advanced));
        assert!(Tier::Ultimate.is_adjacent(Tier::Elite));
        assert!(!Tier::Basic.is_adjacent(Tier::Elite));
        assert!(!Tier::Basic.is_adjacent(Tier::Basic));
    }
}
