// src/models/mod.rs
pub mod notification;
pub mod profile;

pub use notification::*;
pub use profile::*;
