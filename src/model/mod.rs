pub mod branch;
pub mod common;
pub mod compare;
pub mod event;
pub mod namespace;
pub mod release;

pub use branch::*;
pub use common::*;
pub use compare::*;
pub use event::*;
pub use namespace::*;
pub use release::*;
