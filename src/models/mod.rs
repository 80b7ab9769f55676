// src/models/mod.rs

pub mod movement;
pub mod report_kind;

pub use movement::*;
pub use report_kind::*;
