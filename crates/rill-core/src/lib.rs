#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by the rill crates.
//!
//! - [`Interner`]: deduplicated names behind cheap [`Symbol`] handles
//! - [`Colors`]: ANSI palette for dumps, traces and diagnostics
//! - [`utils`]: identifier helpers used when emitting target source

mod colors;
mod interner;
pub mod utils;


pub use colors::Colors;
pub use interner::{Interner, Symbol};
