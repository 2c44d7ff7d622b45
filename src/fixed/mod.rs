use crate::{
    error::BuildError,
    hash::HashFamily,
    select::{Acceptance,Selector},
};

pub mod bucket;
pub mod set;

pub const DEFAULT_COEFFICIENT: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// How the outer hash function is judged. Both bound the total size of the
/// inner tables by O(C*n); they differ in how tight that bound is.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum OuterPolicy {
    /// Colliding pairs <= C*n. Inner tables total at most (2C+1)*n slots.
    CollisionBound,
    /// Sum of squared bucket sizes <= C*n. Inner tables total at most C*n slots.
    SquareSumBound,
}

/// Construction parameters of a [`FixedSet`](set::FixedSet).
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct Config {
    pub coefficient: u64,
    pub outer_policy: OuterPolicy,
    pub max_attempts: usize,
    pub seed: Option<u64>,
}
impl Default for Config {
    fn default() -> Config {
        Config {
            coefficient: DEFAULT_COEFFICIENT,
            outer_policy: OuterPolicy::CollisionBound,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
        }
    }
}
impl Config {
    pub fn with_coefficient(mut self, c: u64) -> Config {
        self.coefficient = c;
        self
    }
    pub fn with_outer_policy(mut self, policy: OuterPolicy) -> Config {
        self.outer_policy = policy;
        self
    }
    pub fn with_max_attempts(mut self, attempts: usize) -> Config {
        self.max_attempts = attempts;
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Config {
        self.seed = Some(seed);
        self
    }
    pub fn validate(&self) -> Result<(),BuildError> {
        if self.max_attempts == 0 { return Err(BuildError::InvalidConfig("max_attempts must be at least 1")); }
        if (self.outer_policy == OuterPolicy::SquareSumBound)&&(self.coefficient == 0) {
            return Err(BuildError::InvalidConfig("square sum bound needs a coefficient of at least 1"));
        }
        Ok(())
    }
    pub(crate) fn outer_acceptance(&self, n: usize) -> Acceptance {
        let limit = self.coefficient.saturating_mul(n as u64);
        match self.outer_policy {
            OuterPolicy::CollisionBound => Acceptance::Collisions(limit),
            OuterPolicy::SquareSumBound => Acceptance::SquareSum(limit),
        }
    }
    pub(crate) fn selector(&self) -> Selector {
        Selector::new(HashFamily::new(),self.max_attempts)
    }
}

// Outer buckets are tiny in expectation, a sorted copy is cheap.
fn check_distinct(keys: &[i64]) -> Result<(),BuildError> {
    if keys.len() < 2 { return Ok(()); }
    let mut tmp = keys.to_vec();
    tmp.sort_unstable();
    for w in tmp.windows(2) {
        if w[0] == w[1] { return Err(BuildError::DuplicateKey(w[0])); }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.coefficient,10);
        assert_eq!(cfg.outer_policy,OuterPolicy::CollisionBound);
        assert_eq!(cfg.max_attempts,100);
        assert_eq!(cfg.seed,None);
        assert_eq!(cfg.validate(),Ok(()));
        assert_eq!(cfg.outer_acceptance(7),Acceptance::Collisions(70));
    }

    #[test]
    fn builder_and_validation() {
        let cfg = Config::default().with_coefficient(4).with_outer_policy(OuterPolicy::SquareSumBound).with_seed(9);
        assert_eq!(cfg.outer_acceptance(5),Acceptance::SquareSum(20));
        assert_eq!(cfg.seed,Some(9));
        assert!(cfg.validate().is_ok());

        assert!(matches!(cfg.clone().with_coefficient(0).validate(),Err(BuildError::InvalidConfig(_))));
        assert!(matches!(Config::default().with_max_attempts(0).validate(),Err(BuildError::InvalidConfig(_))));
        assert!(Config::default().with_coefficient(0).validate().is_ok());
    }

    #[test]
    fn distinct_keys() {
        assert_eq!(check_distinct(&[]),Ok(()));
        assert_eq!(check_distinct(&[5]),Ok(()));
        assert_eq!(check_distinct(&[3,1,2]),Ok(()));
        assert_eq!(check_distinct(&[3,-1,2,-1]),Err(BuildError::DuplicateKey(-1)));
    }
}
