use crate::helpers::extract_number;
use crate::models::Chapter;
use std::cmp::Ordering;

fn chapter_key(chapter: &Chapter) -> Option<f64> {
    extract_number(&chapter.number).and_then(|n| n.parse::<f64>().ok())
}

/// Chapters in reading order with previous/next lookup for the reader page
#[derive(Debug, Clone)]
pub struct ChapterNavigator {
    chapters: Vec<Chapter>,
}

impl ChapterNavigator {
    /// Orders by the numeric part of the chapter label; unnumbered chapters
    /// (prologues, extras) sort first in label order.
    pub fn new(mut chapters: Vec<Chapter>) -> Self {
        chapters.sort_by(|a, b| match (chapter_key(a), chapter_key(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => a.number.cmp(&b.number),
        });
        Self { chapters }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn position(&self, chapter_id: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.id == chapter_id)
    }

    pub fn previous(&self, chapter_id: &str) -> Option<&Chapter> {
        let idx = self.position(chapter_id)?;
        idx.checked_sub(1).and_then(|i| self.chapters.get(i))
    }

    pub fn next(&self, chapter_id: &str) -> Option<&Chapter> {
        let idx = self.position(chapter_id)?;
        self.chapters.get(idx + 1)
    }

    pub fn first(&self) -> Option<&Chapter> {
        self.chapters.first()
    }

    pub fn latest(&self) -> Option<&Chapter> {
        self.chapters.last()
    }
}
