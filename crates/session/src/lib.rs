//! Session Store: keyed, TTL-bound storage for conversation state and
//! short-term message history.
//!
//! The store is the only shared mutable resource in the engine. Everything
//! else reads and mutates session data exclusively through the
//! [`SessionStore`] trait, so the in-process implementation can be swapped
//! for a distributed cache without touching callers.
//!
//! Two independent maps back each session: one for [`ConversationState`]
//! (filters, dialog step, last shown products) and one for
//! [`ConversationContext`] (the bounded message history). Both share the same
//! TTL policy: the expiry slides forward on every write, never on read, and a
//! periodic background sweep evicts whatever has lapsed.
//!
//! `update_state` is a read-modify-write sequence, not an atomic operation.
//! Turns for one session are assumed to be processed sequentially by the
//! caller; concurrent same-session writers need an external single-writer
//! queue.

pub mod memory;
pub mod store;

pub use memory::InMemorySessionStore;
pub use store::{SessionStore, StatePatch, StoreError};
