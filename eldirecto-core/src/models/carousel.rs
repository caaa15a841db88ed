use serde::{Deserialize, Serialize};
use std::fmt;

use super::{new_record_id, ContentSnapshot, Ordered, Record};
use crate::collection::CollectionKind;
use crate::ordering::{self, OrderPatch};

/// Where a carousel image lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageRef {
    /// A publicly reachable URI.
    Uri { uri: String },
    /// A blob uploaded to the image host, referenced by key.
    Blob { key: String },
}

impl ImageRef {
    pub fn uri(uri: impl Into<String>) -> Self {
        ImageRef::Uri { uri: uri.into() }
    }

    pub fn blob(key: impl Into<String>) -> Self {
        ImageRef::Blob { key: key.into() }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Uri { uri } => write!(f, "{}", uri),
            ImageRef::Blob { key } => write!(f, "blob:{}", key),
        }
    }
}

/// One slide of the hero carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselItem {
    pub id: String,
    pub image: ImageRef,
    pub title: String,
    pub description: String,
    pub order: u32,
}

impl CarouselItem {
    /// Creates a slide with a fresh local id. `order` is assigned on insert.
    pub fn new(image: ImageRef, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            image,
            title: title.into(),
            description: description.into(),
            order: 0,
        }
    }
}

impl Record for CarouselItem {
    const KIND: CollectionKind = CollectionKind::Carousel;

    fn id(&self) -> &str {
        &self.id
    }

    fn records(snapshot: &ContentSnapshot) -> &[Self] {
        &snapshot.carousel
    }

    fn replace_all(snapshot: &mut ContentSnapshot, records: Vec<Self>) {
        snapshot.carousel = records;
    }

    fn compact(records: &mut [Self]) -> Vec<OrderPatch> {
        ordering::compact(records)
    }
}

impl Ordered for CarouselItem {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

impl fmt::Display for CarouselItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}. {}", self.order, self.title)?;
        writeln!(f, "   {}", self.description)?;
        write!(f, "   image: {}", self.image)
    }
}
