//! Citation key generation for bibliography entries
//!
//! This crate provides:
//! - Four key formats built from author, year, title and venue
//! - Placeholder tokens for missing metadata
//! - ASCII folding and identifier cleaning
//! - Batch collision resolution with letter, then number, suffixes

pub mod cite_key;

pub use cite_key::*;
