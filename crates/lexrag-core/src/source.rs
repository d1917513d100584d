//! Source discriminants for stored documents and QA provenance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Document family a chunk or search result belongs to.
///
/// This is the fixed allow-list for the store's `source` filter column.
/// Filter predicates are built from [`Source::as_str`] only, never from a
/// caller-supplied string, so arbitrary text can never reach a query
/// expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Law,
    Guideline,
    Qa,
    Violation,
}

impl Source {
    /// All valid source values, in filter-column order.
    pub const ALL: [Source; 4] = [
        Source::Law,
        Source::Guideline,
        Source::Qa,
        Source::Violation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Law => "law",
            Source::Guideline => "guideline",
            Source::Qa => "qa",
            Source::Violation => "violation",
        }
    }

    /// Parse a source string against the allow-list.
    ///
    /// Anything outside the four known values is rejected; this is the
    /// mandatory gate in front of every filter predicate.
    pub fn parse(s: &str) -> Result<Self, ParseSourceError> {
        match s {
            "law" => Ok(Source::Law),
            "guideline" => Ok(Source::Guideline),
            "qa" => Ok(Source::Qa),
            "violation" => Ok(Source::Violation),
            other => Err(ParseSourceError(other.to_string())),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::parse(s)
    }
}

/// A source string outside the fixed allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid source {0:?} (expected one of: law, guideline, qa, violation)")]
pub struct ParseSourceError(pub String);

/// Provenance of a question/answer corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaSource {
    Faq,
    Interpretation,
    Consultation,
}

impl QaSource {
    pub fn as_str(self) -> &'static str {
        match self {
            QaSource::Faq => "faq",
            QaSource::Interpretation => "interpretation",
            QaSource::Consultation => "consultation",
        }
    }
}

impl std::fmt::Display for QaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_sources() {
        assert_eq!(Source::parse("law").unwrap(), Source::Law);
        assert_eq!(Source::parse("guideline").unwrap(), Source::Guideline);
        assert_eq!(Source::parse("qa").unwrap(), Source::Qa);
        assert_eq!(Source::parse("violation").unwrap(), Source::Violation);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(Source::parse("Law").is_err());
        assert!(Source::parse("").is_err());
    }

    #[test]
    fn parse_rejects_injection_strings() {
        let err = Source::parse("'; DROP TABLE legal_documents; --").unwrap_err();
        assert!(err.to_string().contains("invalid source"));
    }

    #[test]
    fn round_trips_through_as_str() {
        for s in Source::ALL {
            assert_eq!(Source::parse(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Source::Law).unwrap(), "\"law\"");
        assert_eq!(
            serde_json::from_str::<Source>("\"guideline\"").unwrap(),
            Source::Guideline
        );
    }
}
