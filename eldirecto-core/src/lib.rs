//! El Directo Core Library
//!
//! Content models and the admin synchronization layer shared by the CLI and
//! the reference gateway server.

pub mod collection;
pub mod diff;
pub mod error;
pub mod gateway;
pub mod mail;
pub mod mirror;
pub mod models;
pub mod ordering;
pub mod session;
pub mod store;
pub mod throttle;

pub use collection::{CollectionKind, LoadState};
pub use diff::compute_delta;
pub use error::ContentError;
pub use gateway::{Gateway, GatewayError, HttpGateway};
pub use mail::{ContactError, ContactMessage, FieldError};
pub use mirror::{DurableMirror, MirrorError, MirroredCache};
pub use models::{
    AboutContent, BranchRef, CarouselItem, ContactEntry, ContentSnapshot, ImageRef, Ordered,
    Record, ScheduleEntry,
};
pub use ordering::{Direction, MoveOutcome, OrderPatch};
pub use session::Session;
pub use store::{ContentStore, LoadReport, SaveOutcome};
pub use throttle::SubmissionThrottle;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
