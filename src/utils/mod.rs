// src/utils/mod.rs

pub mod identity;
pub mod media;
pub mod text;
