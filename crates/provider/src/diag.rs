//! Diagnostics collected while validating and expanding configuration.
//!
//! Expansion never fails fast on the first bad attribute. Errors are
//! accumulated so a single plan surfaces every problem at once, and are
//! folded into a single [`Error`] only at the resource boundary.

use cirrus_common::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    /// Attribute path the diagnostic refers to, when known.
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            attribute: None,
        });
    }

    pub fn add_attribute_error(&mut self, attribute: impl Into<String>, summary: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            attribute: Some(attribute.into()),
        });
    }

    pub fn add_warning(&mut self, summary: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            attribute: None,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Ok when no error-severity diagnostics were recorded.
    pub fn into_result(self) -> Result<()> {
        if !self.has_errors() {
            return Ok(());
        }
        let summary = self
            .entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| match &d.attribute {
                Some(attr) => format!("{}: {}", attr, d.summary),
                None => d.summary.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::InvalidConfig(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diagnostics_are_ok() {
        assert!(Diagnostics::new().into_result().is_ok());
    }

    #[test]
    fn warnings_do_not_fail() {
        let mut diags = Diagnostics::new();
        diags.add_warning("deprecated attribute");
        assert!(!diags.has_errors());
        assert!(diags.into_result().is_ok());
    }

    #[test]
    fn errors_fold_into_invalid_config() {
        let mut diags = Diagnostics::new();
        diags.add_attribute_error("resources.0.cores", "must be positive");
        diags.add_error("name is required");
        let err = diags.into_result().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("resources.0.cores: must be positive"));
        assert!(msg.contains("name is required"));
    }
}
