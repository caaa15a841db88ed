//! El Directo admin tooling.
//!
//! The reference content gateway lives here so the server binary and the
//! integration tests share it. The admin CLI is the `eldirecto` binary.

pub mod server;
