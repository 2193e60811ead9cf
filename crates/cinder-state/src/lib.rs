//! # Cinder State
//!
//! Journaled account state for the transaction application pipeline.
//!
//! Every mutation appends a reversible delta to the [`journal::Journal`];
//! the applier snapshots before each transaction and reverts the suffix on
//! failure. The guarantee underneath the whole applier: for any prefix of
//! mutations applied to a state, reverting them in LIFO order restores the
//! prior state byte for byte.
//!
//! The Merkle-Patricia trie and the on-disk store it wraps are external
//! collaborators; [`StateDb::commit`] produces a deterministic flat
//! commitment over the account set, and [`kv::KeyValueStore`] is the port
//! the chain writer persists through.

pub mod account;
pub mod journal;
pub mod kv;
pub mod statedb;

mod errors;

pub use account::AccountObject;
pub use errors::StateError;
pub use journal::{Journal, JournalEntry};
pub use kv::{KeyValueStore, MemoryDb};
pub use statedb::StateDb;
