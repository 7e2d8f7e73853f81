//! Unit algebra engine: parses unit expressions, canonicalises them into
//! an algebraic tree, checks two unit systems for dimensional agreement,
//! and compiles the numeric mapping and human-readable label rewrite
//! between them.
//!
//! The crate exposes exactly two entry points: [`unit_mapper`] and
//! [`unit_label`]. Everything else here is implementation detail, public
//! within the crate so its pieces can be tested independently but not
//! part of the external API.

mod algebra;
mod analyse;
mod catalogue;
mod complicate;
mod emit;
mod error;
mod eval;
mod fold;
mod mapper;
mod numeral;
mod parser;
mod simplify;
mod sourcepos;
mod tree;

pub use error::{Result, UnitError};
pub use mapper::{unit_label, unit_mapper, Mapping};
