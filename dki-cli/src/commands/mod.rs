//! CLI Commands

pub mod endpoint;
pub mod listen;
