pub mod chain;
pub mod common;
pub mod token;
