//! Structural validation rules for channel-letter sign artwork.
//!
//! Each sign method gets one structure check built from the shared
//! primitives in [`common`]; [`base`] holds the method-independent file
//! hygiene rules and [`pipeline`] ties conversion, import, letter analysis,
//! and rule dispatch together.

pub mod acrylic_face;
pub mod base;
pub mod common;
pub mod front_lit;
pub mod halo_lit;
pub mod pipeline;
pub mod push_thru;

pub use pipeline::{Validator, METHODS};
