//! Pure asset transforms applied by task bodies
//!
//! # Module Structure
//!
//! - [`htmlmin`] - HTML insignificant-whitespace collapsing
//! - [`jsmin`] - Conservative JavaScript minification
//! - [`annotate`] - Angular dependency-injection annotation rewriting
//! - [`sourcemap`] - Source map (v3) emission for concatenated bundles
//!
//! Every transform is a pure function over strings: same input, same
//! output, no filesystem access.

pub mod annotate;
pub mod htmlmin;
pub mod jsmin;
pub mod sourcemap;

pub use annotate::annotate;
pub use htmlmin::collapse_whitespace;
pub use jsmin::{collapse_line_whitespace, minify, strip_comments};
pub use sourcemap::SourceMapBuilder;
