//! Common utilities for chkn.
//!
//! This crate provides the foundational pieces shared by the chkn crates:
//!
//! - [`BinaryReader`] - Bounds-checked little-endian reading from byte slices
//! - [`Error`] - What went wrong when a read ran out of data

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};
