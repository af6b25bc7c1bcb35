//! Validation issues and their severities

use serde::Serialize;

/// What a validation issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A `[` without its `]`, or the reverse.
    UnbalancedBrackets,
    /// Bracket contents that are not `CATEGORY:subtype[=value]`, or text outside brackets.
    MalformedToken,
    /// A category prefix outside the closed set.
    UnknownCategory,
    /// A well-formed token whose subtype the catalog does not hold.
    UnknownSubtype,
    /// Category not uppercase or subtype not lowercase.
    NonCanonicalCase,
    /// No operation token in the sequence.
    MissingOperation,
    /// Token efficiency below the configured minimum.
    LowEfficiency,
    /// Confidence below the configured threshold.
    LowConfidence,
    /// The round trip did not reproduce the original wording.
    RoundTripDrift,
}

impl IssueKind {
    /// Severity this kind is reported with unless overridden
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UnbalancedBrackets
            | Self::MalformedToken
            | Self::UnknownCategory
            | Self::UnknownSubtype => Severity::Error,
            Self::NonCanonicalCase
            | Self::MissingOperation
            | Self::LowEfficiency
            | Self::LowConfidence => Severity::Warning,
            Self::RoundTripDrift => Severity::Info,
        }
    }
}

/// How bad an issue is. Only `Error` makes a translation invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// One finding from a validation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
    pub severity: Severity,
    /// Index of the offending token, when the issue concerns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl ValidationIssue {
    /// Issue at the kind's default severity
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: kind.default_severity(),
            position: None,
        }
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(position) => write!(f, "[{}] token {}: {}", self.severity, position, self.message),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severities() {
        assert_eq!(IssueKind::UnknownSubtype.default_severity(), Severity::Error);
        assert_eq!(IssueKind::NonCanonicalCase.default_severity(), Severity::Warning);
        assert_eq!(IssueKind::RoundTripDrift.default_severity(), Severity::Info);
    }

    #[test]
    fn test_display() {
        let issue = ValidationIssue::new(IssueKind::NonCanonicalCase, "use OP:fetch").at(2);
        assert_eq!(issue.to_string(), "[warning] token 2: use OP:fetch");

        let issue = ValidationIssue::new(IssueKind::RoundTripDrift, "drifted")
            .with_severity(Severity::Warning);
        assert!(!issue.is_error());
        assert_eq!(issue.to_string(), "[warning] drifted");
    }
}
