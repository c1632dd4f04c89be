//! Library crate for user-directory.
//!
//! This crate exposes the building blocks of the dashboard:
//! - Directory records (`model`) and the sources that provide them (`source`)
//! - Loading and filtering of the user collection (`query`)
//! - Dialog focus capture, trapping and restore (`focus`)
//! - Subscribe/notify plumbing for both (`observe`)
//! - Application state and update loop (`app`), view refresh (`search`)
//! - UI rendering (`ui`)
//! - Error and result types (`error`)
//!
//! It is used by the `user-directory` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod error;
pub mod focus;
pub mod model;
pub mod observe;
pub mod query;
pub mod search;
pub mod source;
pub mod ui;

/// Convenient error and result types shared across the crate.
pub use error::{DynError, FetchError, Result};
pub use model::{ROLES, Role, User};
pub use query::{FilterCriteria, UserQuery};
