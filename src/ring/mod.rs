//! Consistent-Hash Ring
//!
//! Maps keys to owning peers so that every node in the cluster computes the
//! same ownership independently, and so that membership changes only move a
//! small fraction of the key space.
//!
//! ## Mechanism
//! - **Virtual nodes**: each peer contributes a configurable number of
//!   positions on the ring, which smooths the distribution across peers.
//! - **Lookup**: a key is hashed onto the ring and owned by the first peer
//!   position at or after it, wrapping around at the top of the hash space.

pub mod hashring;

#[cfg(test)]
mod tests;
