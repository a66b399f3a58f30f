use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use crate::model::ids::{ChapterId, CourseId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("chapter title cannot be empty")]
    EmptyChapterTitle,

    #[error("chapter {0} appears more than once in the course")]
    DuplicateChapter(ChapterId),
}

//
// ─── CHAPTER ───────────────────────────────────────────────────────────────────
//

/// An ordered unit of course content.
///
/// `next` and `previous` are the links reported by the content store. They are
/// `None` at the boundaries of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    id: ChapterId,
    title: String,
    content: String,
    order: u32,
    next: Option<ChapterId>,
    previous: Option<ChapterId>,
}

impl Chapter {
    /// Creates a chapter without neighbour links.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyChapterTitle` if the title is blank.
    pub fn new(
        id: ChapterId,
        title: impl Into<String>,
        content: impl Into<String>,
        order: u32,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyChapterTitle);
        }
        Ok(Self {
            id,
            title: title.trim().to_owned(),
            content: content.into(),
            order,
            next: None,
            previous: None,
        })
    }

    #[must_use]
    pub fn with_links(mut self, next: Option<ChapterId>, previous: Option<ChapterId>) -> Self {
        self.next = next;
        self.previous = previous;
        self
    }

    #[must_use]
    pub fn id(&self) -> &ChapterId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn next_id(&self) -> Option<&ChapterId> {
        self.next.as_ref()
    }

    #[must_use]
    pub fn previous_id(&self) -> Option<&ChapterId> {
        self.previous.as_ref()
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A course as supplied by the content store.
///
/// Chapter order is instructional order. Listing endpoints return courses
/// without chapters, so `chapters()` may be empty even for a populated course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    chapters: Vec<Chapter>,
    prerequisites: BTreeSet<CourseId>,
}

impl Course {
    /// Creates a course with no chapters and no prerequisites.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description: description.into(),
            chapters: Vec::new(),
            prerequisites: BTreeSet::new(),
        })
    }

    /// Attach the ordered chapter list.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::DuplicateChapter` if two chapters share an id.
    pub fn with_chapters(mut self, chapters: Vec<Chapter>) -> Result<Self, CourseError> {
        let mut seen = HashSet::with_capacity(chapters.len());
        for chapter in &chapters {
            if !seen.insert(chapter.id()) {
                return Err(CourseError::DuplicateChapter(chapter.id().clone()));
            }
        }
        self.chapters = chapters;
        Ok(self)
    }

    #[must_use]
    pub fn with_prerequisites(mut self, prerequisites: impl IntoIterator<Item = CourseId>) -> Self {
        self.prerequisites = prerequisites.into_iter().collect();
        self
    }

    /// Listing shape of this course: same metadata, no chapters.
    #[must_use]
    pub fn without_chapters(&self) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            chapters: Vec::new(),
            prerequisites: self.prerequisites.clone(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    #[must_use]
    pub fn prerequisites(&self) -> &BTreeSet<CourseId> {
        &self.prerequisites
    }

    #[must_use]
    pub fn chapter(&self, id: &ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id() == id)
    }

    fn position(&self, id: &ChapterId) -> Option<usize> {
        self.chapters.iter().position(|c| c.id() == id)
    }

    /// Chapter that follows `id`.
    ///
    /// An explicit `next` link wins when it resolves inside this course;
    /// otherwise the sequence position is used.
    #[must_use]
    pub fn next_chapter(&self, id: &ChapterId) -> Option<&Chapter> {
        let pos = self.position(id)?;
        if let Some(linked) = self.chapters[pos].next_id().and_then(|n| self.chapter(n)) {
            return Some(linked);
        }
        self.chapters.get(pos + 1)
    }

    /// Chapter that precedes `id`, resolved the same way as `next_chapter`.
    #[must_use]
    pub fn previous_chapter(&self, id: &ChapterId) -> Option<&Chapter> {
        let pos = self.position(id)?;
        if let Some(linked) = self.chapters[pos].previous_id().and_then(|p| self.chapter(p)) {
            return Some(linked);
        }
        pos.checked_sub(1).and_then(|prev| self.chapters.get(prev))
    }
}
