use std::fmt;

use crate::runtime::error::Fault;

/// The argument counts a callable accepts: a set of fixed counts plus an
/// optional open-ended minimum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Arity {
    fixed: Vec<usize>,
    at_least: Option<usize>,
}

impl Arity {
    pub fn fixed(count: usize) -> Self {
        Self {
            fixed: vec![count],
            at_least: None,
        }
    }

    pub fn at_least(min: usize) -> Self {
        Self {
            fixed: Vec::new(),
            at_least: Some(min),
        }
    }

    pub fn range(min: usize, max: usize) -> Self {
        Self {
            fixed: (min..=max).collect(),
            at_least: None,
        }
    }

    pub fn any() -> Self {
        Self::at_least(0)
    }

    pub fn from_parts(mut fixed: Vec<usize>, at_least: Option<usize>) -> Self {
        fixed.sort_unstable();
        fixed.dedup();
        if let Some(min) = at_least {
            fixed.retain(|count| *count < min);
        }
        Self { fixed, at_least }
    }

    pub fn accepts(&self, count: usize) -> bool {
        self.at_least.is_some_and(|min| count >= min) || self.fixed.binary_search(&count).is_ok()
    }

    pub fn check(&self, count: usize) -> Result<(), Fault> {
        if self.accepts(count) {
            return Ok(());
        }
        Err(Fault::UnmatchedArity {
            expected: self.to_string(),
            got: count,
        })
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.fixed.iter().map(|c| c.to_string()).collect();
        if let Some(min) = self.at_least {
            parts.push(format!("at least {}", min));
        }
        match parts.len() {
            0 => write!(f, "nothing"),
            1 => write!(f, "{}", parts[0]),
            2 => write!(f, "{} or {}", parts[0], parts[1]),
            n => write!(f, "{}, or {}", parts[..n - 1].join(", "), parts[n - 1]),
        }
    }
}
