//! Change classification between two scans.

use crate::novel::Novel;
use std::collections::BTreeMap;

/// How a novel changed relative to the previous scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    New,
    Updated,
    Unchanged,
    Removed,
}

/// Slugs partitioned by change kind. Each slug appears in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub new: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeSet {
    /// Adds a slug to the list for `kind`.
    pub fn push(&mut self, kind: ChangeKind, slug: String) {
        match kind {
            ChangeKind::New => self.new.push(slug),
            ChangeKind::Updated => self.updated.push(slug),
            ChangeKind::Unchanged => self.unchanged.push(slug),
            ChangeKind::Removed => self.removed.push(slug),
        }
    }

    /// Returns the change kind recorded for a slug, if any.
    pub fn kind_of(&self, slug: &str) -> Option<ChangeKind> {
        [
            (ChangeKind::New, &self.new),
            (ChangeKind::Updated, &self.updated),
            (ChangeKind::Unchanged, &self.unchanged),
            (ChangeKind::Removed, &self.removed),
        ]
        .into_iter()
        .find(|(_, slugs)| slugs.iter().any(|s| s == slug))
        .map(|(kind, _)| kind)
    }

    /// Number of new, updated and removed novels.
    pub fn total_changes(&self) -> usize {
        self.new.len() + self.updated.len() + self.removed.len()
    }

    /// Returns true when nothing was added, updated or removed.
    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

/// Classifies the current novels against the previously cached ones.
///
/// Both maps are keyed by slug. Iteration follows slug order, so the
/// resulting lists are sorted.
pub fn classify(
    current: &BTreeMap<String, Novel>,
    previous: &BTreeMap<String, Novel>,
) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (slug, novel) in current {
        let kind = match previous.get(slug) {
            None => ChangeKind::New,
            Some(cached) if has_content_changed(novel, cached) => ChangeKind::Updated,
            Some(_) => ChangeKind::Unchanged,
        };
        tracing::debug!(slug = %slug, kind = ?kind, "Classified novel");
        changes.push(kind, slug.clone());
    }

    for slug in previous.keys().filter(|slug| !current.contains_key(*slug)) {
        tracing::debug!(slug = %slug, "Novel removed");
        changes.push(ChangeKind::Removed, slug.clone());
    }

    changes
}

/// Decides whether a novel differs from its cached version.
///
/// Compares fingerprints when both are available. Otherwise falls back to
/// chapter count, total word count and description, which cannot see edits
/// that keep all three the same (e.g. whitespace-only changes).
pub fn has_content_changed(current: &Novel, cached: &Novel) -> bool {
    match (usable_hash(current), usable_hash(cached)) {
        (Some(a), Some(b)) => a != b,
        _ => {
            current.total_chapters != cached.total_chapters
                || current.word_count != cached.word_count
                || current.description != cached.description
        }
    }
}

fn usable_hash(novel: &Novel) -> Option<&str> {
    novel.content_hash.as_deref().filter(|hash| !hash.is_empty())
}
