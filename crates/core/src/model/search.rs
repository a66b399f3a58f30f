use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SearchHitError {
    #[error("search hit title cannot be empty")]
    EmptyTitle,

    #[error("relevance must be in [0, 1], got {0}")]
    InvalidRelevance(f64),

    #[error("unknown search scope: {0}")]
    UnknownScope(String),
}

/// What a search hit points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Course,
    Chapter,
}

/// Which part of the catalogue a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchScope {
    #[default]
    All,
    Courses,
    Chapters,
}

impl SearchScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchScope::All => "all",
            SearchScope::Courses => "courses",
            SearchScope::Chapters => "chapters",
        }
    }

    #[must_use]
    pub fn includes(self, kind: SearchKind) -> bool {
        matches!(
            (self, kind),
            (SearchScope::All, _)
                | (SearchScope::Courses, SearchKind::Course)
                | (SearchScope::Chapters, SearchKind::Chapter)
        )
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = SearchHitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SearchScope::All),
            "courses" | "course" => Ok(SearchScope::Courses),
            "chapters" | "chapter" => Ok(SearchScope::Chapters),
            other => Err(SearchHitError::UnknownScope(other.to_string())),
        }
    }
}

/// A single ranked result returned by the search backend.
///
/// Ranking happens in the backend; the client only displays hits in the order
/// received.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub course_id: Option<String>,
    pub course_title: Option<String>,
    relevance: f64,
}

impl SearchHit {
    /// # Errors
    ///
    /// Returns `SearchHitError` for a blank title or a relevance outside `[0, 1]`.
    pub fn new(
        kind: SearchKind,
        id: impl Into<String>,
        title: impl Into<String>,
        relevance: f64,
    ) -> Result<Self, SearchHitError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SearchHitError::EmptyTitle);
        }
        if !relevance.is_finite() || !(0.0..=1.0).contains(&relevance) {
            return Err(SearchHitError::InvalidRelevance(relevance));
        }
        Ok(Self {
            kind,
            id: id.into(),
            title,
            description: None,
            course_id: None,
            course_title: None,
            relevance,
        })
    }

    #[must_use]
    pub fn with_course(mut self, course_id: impl Into<String>, course_title: Option<String>) -> Self {
        self.course_id = Some(course_id.into());
        self.course_title = course_title;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn relevance(&self) -> f64 {
        self.relevance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_aliases() {
        assert_eq!("Courses".parse::<SearchScope>().unwrap(), SearchScope::Courses);
        assert_eq!("chapter".parse::<SearchScope>().unwrap(), SearchScope::Chapters);
        assert!("lessons".parse::<SearchScope>().is_err());
    }

    #[test]
    fn scope_filters_kinds() {
        assert!(SearchScope::All.includes(SearchKind::Chapter));
        assert!(SearchScope::Courses.includes(SearchKind::Course));
        assert!(!SearchScope::Courses.includes(SearchKind::Chapter));
    }

    #[test]
    fn hit_rejects_relevance_above_one() {
        let err = SearchHit::new(SearchKind::Course, "c1", "Python", 1.01).unwrap_err();
        assert_eq!(err, SearchHitError::InvalidRelevance(1.01));
    }
}
