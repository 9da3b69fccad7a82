//! Snippet categories and the snippets embedded in them.
//!
//! # Responsibility
//! - Define the `snippetCategories` document shape.
//! - Generate snippet ids and apply drafts to a category in memory.
//!
//! # Invariants
//! - `snippets` keeps insertion order; nothing reorders it.
//! - Snippet ids are unique within one category as long as they come from
//!   [`SnippetIdGenerator`].
//! - `expand` is UI state persisted next to the data and omitted when unset.

use super::validation::{validate_name, NameField, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of snippet content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub value: String,
}

impl ContentBlock {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A reusable piece of text owned by a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Epoch-millisecond string assigned at creation.
    pub id: String,
    /// Soft reference to a `Group` name.
    pub group: String,
    pub name: String,
    pub content: Vec<ContentBlock>,
}

/// Document stored in the `snippetCategories` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetCategory {
    pub name: String,
    #[serde(default)]
    pub snippets: Vec<Snippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<bool>,
}

impl SnippetCategory {
    /// Creates an empty category.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            snippets: Vec::new(),
            expand: None,
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_name(NameField::Category, &self.name)
    }

    pub fn find_snippet(&self, id: &str) -> Option<&Snippet> {
        self.snippets.iter().find(|snippet| snippet.id == id)
    }

    /// Applies a draft to this category.
    ///
    /// When `draft.id` names an existing snippet it is edited in place and
    /// keeps its position. Otherwise a new snippet is appended under
    /// `new_id`, or past the highest numeric id when `new_id` is already
    /// taken. Returns the resulting snippet.
    pub fn apply_draft(&mut self, draft: SnippetDraft, new_id: String) -> Snippet {
        let existing = draft
            .id
            .as_deref()
            .and_then(|id| self.snippets.iter_mut().find(|snippet| snippet.id == id));

        match existing {
            Some(snippet) => {
                snippet.name = draft.name;
                snippet.group = draft.group;
                snippet.content = draft.content;
                snippet.clone()
            }
            None => {
                let snippet = Snippet {
                    id: self.unused_id(new_id),
                    group: draft.group,
                    name: draft.name,
                    content: draft.content,
                };
                self.snippets.push(snippet.clone());
                snippet
            }
        }
    }

    fn unused_id(&self, candidate: String) -> String {
        if self.find_snippet(&candidate).is_none() {
            return candidate;
        }
        let highest = self
            .snippets
            .iter()
            .filter_map(|snippet| snippet.id.parse::<u64>().ok())
            .chain(candidate.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (highest + 1).to_string()
    }

    /// Removes the snippet with `id`. Returns whether anything was removed.
    pub fn remove_snippet(&mut self, id: &str) -> bool {
        let before = self.snippets.len();
        self.snippets.retain(|snippet| snippet.id != id);
        self.snippets.len() != before
    }

    /// Buckets snippets by group name, buckets ordered by first appearance.
    pub fn grouped_snippets(&self) -> Vec<SnippetBucket> {
        let mut buckets: Vec<SnippetBucket> = Vec::new();
        for snippet in &self.snippets {
            match buckets.iter_mut().find(|bucket| bucket.group == snippet.group) {
                Some(bucket) => bucket.snippets.push(snippet.clone()),
                None => buckets.push(SnippetBucket {
                    group: snippet.group.clone(),
                    snippets: vec![snippet.clone()],
                }),
            }
        }
        buckets
    }
}

/// Snippets of one category that share a group name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetBucket {
    pub group: String,
    pub snippets: Vec<Snippet>,
}

/// User input for creating or editing a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetDraft {
    /// Present when editing an existing snippet.
    pub id: Option<String>,
    pub group: String,
    pub name: String,
    pub content: Vec<ContentBlock>,
}

impl SnippetDraft {
    /// Draft for a new snippet.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        content: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: None,
            group: group.into(),
            name: name.into(),
            content: content.into_iter().map(ContentBlock::new).collect(),
        }
    }

    /// Marks this draft as an edit of snippet `id`.
    pub fn editing(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_name(NameField::Snippet, &self.name)?;
        if self.group.trim().is_empty() {
            return Err(ValidationError::MissingGroup);
        }
        if self.content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        if let Some(index) = self
            .content
            .iter()
            .position(|block| block.value.trim().is_empty())
        {
            return Err(ValidationError::BlankContentBlock { index });
        }
        Ok(())
    }
}

/// Hands out snippet ids from the wall clock in epoch milliseconds.
///
/// Ids are strictly increasing for the lifetime of the generator even if the
/// clock stalls or steps backwards.
#[derive(Debug, Default)]
pub struct SnippetIdGenerator {
    last: AtomicU64,
}

impl SnippetIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        self.next_id_at(now_epoch_ms()).to_string()
    }

    fn next_id_at(&self, now_ms: u64) -> u64 {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(observed) => last = observed,
            }
        }
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::{ContentBlock, SnippetCategory, SnippetDraft, SnippetIdGenerator};
    use crate::model::validation::ValidationError;

    fn category_with_two_groups() -> SnippetCategory {
        let mut category = SnippetCategory::new("Shell");
        category.apply_draft(SnippetDraft::new("Common", "hi", ["echo hi"]), "1".into());
        category.apply_draft(SnippetDraft::new("Git", "st", ["git status"]), "2".into());
        category.apply_draft(SnippetDraft::new("Common", "ls", ["ls -la"]), "3".into());
        category
    }

    #[test]
    fn id_generator_is_strictly_increasing_when_clock_stalls() {
        let ids = SnippetIdGenerator::new();
        assert_eq!(ids.next_id_at(1_000), 1_000);
        assert_eq!(ids.next_id_at(1_000), 1_001);
        assert_eq!(ids.next_id_at(900), 1_002);
        assert_eq!(ids.next_id_at(5_000), 5_000);
    }

    #[test]
    fn apply_draft_edits_in_place_and_keeps_position() {
        let mut category = category_with_two_groups();
        let edited = category.apply_draft(
            SnippetDraft::new("Git", "hello", ["echo hello"]).editing("1"),
            "99".into(),
        );

        assert_eq!(edited.id, "1");
        assert_eq!(category.snippets.len(), 3);
        assert_eq!(category.snippets[0].name, "hello");
        assert_eq!(category.snippets[0].group, "Git");
        assert_eq!(
            category.snippets[0].content,
            vec![ContentBlock::new("echo hello")]
        );
    }

    #[test]
    fn apply_draft_with_unknown_id_appends_under_new_id() {
        let mut category = category_with_two_groups();
        let created =
            category.apply_draft(SnippetDraft::new("Common", "x", ["x"]).editing("nope"), "4".into());

        assert_eq!(created.id, "4");
        assert_eq!(category.snippets.last().map(|s| s.id.as_str()), Some("4"));
    }

    #[test]
    fn apply_draft_never_reuses_an_existing_id() {
        let mut category = category_with_two_groups();
        category.apply_draft(SnippetDraft::new("Common", "late", ["x"]), "1700".into());

        let created = category.apply_draft(SnippetDraft::new("Common", "again", ["y"]), "2".into());
        assert_eq!(created.id, "1701");

        let ids: Vec<_> = category.snippets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "1700", "1701"]);
        assert!(category.remove_snippet("2"));
        assert_eq!(category.snippets.len(), 4);
    }

    #[test]
    fn grouped_snippets_keeps_first_appearance_order() {
        let buckets = category_with_two_groups().grouped_snippets();

        let groups: Vec<_> = buckets.iter().map(|b| b.group.as_str()).collect();
        assert_eq!(groups, ["Common", "Git"]);
        assert_eq!(buckets[0].snippets.len(), 2);
        assert_eq!(buckets[0].snippets[1].id, "3");
    }

    #[test]
    fn remove_snippet_reports_whether_it_removed() {
        let mut category = category_with_two_groups();
        assert!(category.remove_snippet("2"));
        assert!(!category.remove_snippet("2"));
        assert_eq!(category.snippets.len(), 2);
    }

    #[test]
    fn draft_validation_flags_blank_content_block() {
        let draft = SnippetDraft::new("Common", "s1", ["ok", "  "]);
        assert_eq!(
            draft.validate().unwrap_err(),
            ValidationError::BlankContentBlock { index: 1 }
        );

        let empty = SnippetDraft::new("Common", "s1", Vec::<String>::new());
        assert_eq!(empty.validate().unwrap_err(), ValidationError::EmptyContent);
    }

    #[test]
    fn expand_is_omitted_from_json_when_unset() {
        let json = serde_json::to_value(SnippetCategory::new("Shell")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Shell", "snippets": [] }));
    }
}
