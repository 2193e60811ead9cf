//! Consensus scenarios over a live witness ring.

mod happy_path;
mod reject_cycle;
