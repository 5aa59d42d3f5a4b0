//! Known irregular files mapped straight to a spec by filename suffix.

use tracing::debug;

use crate::models::{DocumentSpec, SpecialCase};

#[derive(Debug, Clone, Default)]
pub struct SpecialCases {
    cases: Vec<SpecialCase>,
}

impl SpecialCases {
    pub fn new(cases: Vec<SpecialCase>) -> Self {
        Self { cases }
    }

    /// Spec of the first case whose suffix ends `file_name`.
    pub fn lookup(&self, file_name: &str) -> Option<&DocumentSpec> {
        let case = self
            .cases
            .iter()
            .find(|case| !case.suffix.is_empty() && file_name.ends_with(&case.suffix))?;
        debug!("Special case {} applies to {}", case.suffix, file_name);
        Some(&case.spec)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
