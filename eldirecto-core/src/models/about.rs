use serde::{Deserialize, Serialize};

use super::{ContentSnapshot, Record};
use crate::collection::CollectionKind;

/// The "about us" text. A singleton collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AboutContent {
    #[serde(default)]
    pub id: String,
    pub content: String,
}

impl AboutContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            content: content.into(),
        }
    }

    /// Paragraphs of the text, split on blank lines.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

impl Record for AboutContent {
    const KIND: CollectionKind = CollectionKind::About;

    fn id(&self) -> &str {
        &self.id
    }

    fn records(snapshot: &ContentSnapshot) -> &[Self] {
        std::slice::from_ref(&snapshot.about)
    }

    fn replace_all(snapshot: &mut ContentSnapshot, records: Vec<Self>) {
        snapshot.about = records.into_iter().next().unwrap_or_default();
    }
}
