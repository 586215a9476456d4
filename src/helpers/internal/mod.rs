//! Internal helpers shared across the acquire and build modules

pub mod fs_utils;
pub mod hash;
pub mod process;
