//! Application layer: page assembly, production, and resolution.

pub mod assemble;
pub mod error;
pub mod locate;
pub mod page;
pub mod produce;
