//! CLI command implementations

pub mod doctor;
pub mod index;
pub mod info;
pub mod search;
