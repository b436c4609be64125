//! Route handlers, one module per resource.

pub mod health;
pub mod resolve;
pub mod skill;
