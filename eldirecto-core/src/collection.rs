//! Collection identifiers and per-collection load state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four independently managed content collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Carousel,
    Contact,
    Schedule,
    About,
}

impl CollectionKind {
    /// All collections, in load order.
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Carousel,
        CollectionKind::Contact,
        CollectionKind::Schedule,
        CollectionKind::About,
    ];

    /// Returns the wire name used in gateway paths.
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Carousel => "carousel",
            CollectionKind::Contact => "contact",
            CollectionKind::Schedule => "schedule",
            CollectionKind::About => "about",
        }
    }

    /// Parse from wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "carousel" => Some(CollectionKind::Carousel),
            "contact" => Some(CollectionKind::Contact),
            "schedule" => Some(CollectionKind::Schedule),
            "about" => Some(CollectionKind::About),
            _ => None,
        }
    }

    /// Whether records in this collection carry a dense `order` field.
    pub fn is_ordered(&self) -> bool {
        matches!(self, CollectionKind::Carousel | CollectionKind::Schedule)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Load state of a single collection.
///
/// `Unloaded -> Loading -> {Loaded | LoadedFromFallback}`. Only the loaded
/// states allow edits to be submitted upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    LoadedFromFallback,
}

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::LoadedFromFallback)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Unloaded => write!(f, "unloaded"),
            LoadState::Loading => write!(f, "loading"),
            LoadState::Loaded => write!(f, "loaded"),
            LoadState::LoadedFromFallback => write!(f, "loaded (fallback)"),
        }
    }
}
