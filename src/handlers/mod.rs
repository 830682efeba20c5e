//! Handler set
//! - completion.rs, hover.rs, definition.rs, rename.rs, formatting.rs
//!
//! One pure function per request method. Each takes an immutable snapshot,
//! the request params, the analysis engine and a cancel flag, and returns a
//! protocol result. No handler touches shared mutable state, so any number
//! of them may run concurrently over the same or different snapshots.
//! Handlers poll the flag before delegating and again after the engine
//! returns, since the engine call may have blocked for a while.

pub mod completion;
pub mod definition;
pub mod formatting;
pub mod hover;
pub mod rename;

pub use completion::completion;
pub use definition::definition;
pub use formatting::formatting;
pub use hover::hover;
pub use rename::rename;
