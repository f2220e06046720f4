//! Resource address patterns and wildcard expansion.
//!
//! An address pattern is a Terraform resource or module address that may
//! contain `*` wildcards. Each wildcard matches exactly one path segment: it
//! never matches `.`, whitespace, `[` or `]`.
//!
//! # Example
//!
//! ```
//! use tfshift_core::address::{expand, MoveOperation};
//!
//! let listing = vec![
//!     "module.a[0].r".to_string(),
//!     "module.a[1].r".to_string(),
//!     "module.b.r".to_string(),
//! ];
//! let ops = expand(&listing, "module.a[*].r", "module.new[$1].r").unwrap();
//! assert_eq!(ops, vec![
//!     MoveOperation::new("module.a[0].r", "module.new[0].r"),
//!     MoveOperation::new("module.a[1].r", "module.new[1].r"),
//! ]);
//! ```

pub mod expand;
pub mod pattern;

pub use expand::{expand, MoveOperation};
pub use pattern::{compile, wildcard_count, PatternError, WILDCARD, WILDCARD_CAPTURE};
