// Core primitives for permissive record reading

pub mod fields;
pub mod quote;
pub mod terminator;

pub use fields::*;
pub use quote::*;
pub use terminator::*;
