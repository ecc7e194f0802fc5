//! Process Engine Domain Types
//!
//! The leaf types shared by the tick engine and its collaborators.
//! Nothing in this crate knows about scheduling; it only defines what
//! an element *is* and how its data behaves across a tick.
//!
//! # Key Concepts
//!
//! - **Element**: identity of every node. The `id` is always derived from
//!   the `name` and freezes once the element is locked.
//! - **ValueCell**: a double-buffered payload. Writes made while locked are
//!   staged and only become visible on `commit`.
//! - **FunctionRef**: a `(module, member, scope)` key naming a behavior in a
//!   registry, so graphs can be stored without closures.
//! - **RunState**: the lifecycle shared by tasks and processes.

#![deny(unsafe_code)]

mod config;
mod element;
mod errors;
mod function;
mod state;
mod value;

pub use config::*;
pub use element::*;
pub use errors::*;
pub use function::*;
pub use state::*;
pub use value::*;
