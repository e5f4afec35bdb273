// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod convert;
pub mod dialect;
pub mod loader;
pub mod parser;
pub mod timeshift;
