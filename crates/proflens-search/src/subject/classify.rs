use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse academic subject a query can be about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Math,
    Computer,
    Chemistry,
    Physics,
    Psychology,
    Medical,
    English,
}

/// Classification table, checked top to bottom. The first subject with any
/// keyword occurring in the lowercased query wins.
///
/// Keywords are substrings, so short ones must not occur inside common words
/// of other subjects (`cs` would fire on "physics").
const SUBJECT_KEYWORDS: &[(Subject, &[&str])] = &[
    (
        Subject::Math,
        &["math", "calculus", "algebra", "geometry", "statistics", "trigonometry"],
    ),
    (
        Subject::Computer,
        &["computer", "programming", "coding", "software", "algorithm", "data"],
    ),
    (Subject::Chemistry, &["chem", "organic"]),
    (
        Subject::Physics,
        &["physics", "mechanics", "quantum", "astronomy", "thermodynamics"],
    ),
    (Subject::Psychology, &["psych", "cognitive", "behavior"]),
    (
        Subject::Medical,
        &["medic", "anatomy", "nursing", "physiology", "pre-med", "health"],
    ),
    (
        Subject::English,
        &["english", "literature", "writing", "poetry", "composition"],
    ),
];

impl Subject {
    pub const ALL: [Self; 7] = [
        Self::Math,
        Self::Computer,
        Self::Chemistry,
        Self::Physics,
        Self::Psychology,
        Self::Medical,
        Self::English,
    ];

    /// Lowercase keywords for this subject.
    #[must_use]
    pub fn keywords(self) -> &'static [&'static str] {
        SUBJECT_KEYWORDS
            .iter()
            .find(|(subject, _)| *subject == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Computer => "computer",
            Self::Chemistry => "chemistry",
            Self::Physics => "physics",
            Self::Psychology => "psychology",
            Self::Medical => "medical",
            Self::English => "english",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a query to a subject using only the query text.
#[must_use]
pub fn classify(query: &str) -> Option<Subject> {
    let query = query.to_lowercase();
    SUBJECT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| query.contains(kw)))
        .map(|(subject, _)| *subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_queries() {
        assert_eq!(classify("best professor for calculus"), Some(Subject::Math));
        assert_eq!(classify("organic chemistry teachers"), Some(Subject::Chemistry));
        assert_eq!(classify("hello there"), None);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(classify("Intro To PROGRAMMING"), Some(Subject::Computer));
        assert_eq!(classify("PSYCHOLOGY introduction"), Some(Subject::Psychology));
    }

    #[test]
    fn physics_is_not_mistaken_for_computing() {
        assert_eq!(classify("physics with labs"), Some(Subject::Physics));
    }

    #[test]
    fn physiology_is_medical() {
        assert_eq!(classify("anatomy and physiology"), Some(Subject::Medical));
    }

    #[test]
    fn table_order_breaks_ties() {
        // Both math and computer keywords appear; math is checked first.
        assert_eq!(classify("math for computer graphics"), Some(Subject::Math));
    }

    #[test]
    fn every_subject_has_keywords() {
        for subject in Subject::ALL {
            assert!(!subject.keywords().is_empty(), "{subject} has no keywords");
            assert!(
                subject
                    .keywords()
                    .iter()
                    .all(|kw| *kw == kw.to_lowercase()),
                "{subject} keywords must be lowercase"
            );
        }
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&Subject::Chemistry).expect("serialize");
        assert_eq!(json, "\"chemistry\"");
    }
}
