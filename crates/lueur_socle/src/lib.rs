//! Socle - the foundation slab for Lueur.
//!
//! This crate provides the shared utilities and data structures the rest of
//! the Lueur framework is built on: arena allocation for AST construction,
//! compact strings, the wire-stable flag bitmasks exchanged between the
//! compiler and the runtime, and the HTML tag tables.
//!
//! # Example
//!
//! ```
//! use lueur_socle::{Box, Bump, Vec};
//!
//! let allocator = Bump::new();
//!
//! let boxed = Box::new_in(42, &allocator);
//! assert_eq!(*boxed, 42);
//!
//! let mut vec = Vec::new_in(&allocator);
//! vec.push(1);
//! vec.push(2);
//! assert_eq!(vec.len(), 2);
//! ```

pub mod flags;
pub mod general;
pub mod hash;
pub mod tag_config;

// Re-export arena types
pub use bumpalo::boxed::Box;
pub use bumpalo::collections::String as BumpString;
pub use bumpalo::collections::Vec;
pub use bumpalo::Bump;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;
pub use compact_str::CompactString as String;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export bitflags for flag types
pub use bitflags::bitflags;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};

pub use flags::*;
pub use general::*;
pub use tag_config::*;
