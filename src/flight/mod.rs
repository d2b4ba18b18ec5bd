//! Request Coalescing
//!
//! Under concurrent demand for the same key, only one loader or peer call
//! should be in flight at a time. The coalescer tracks in-flight calls by
//! key: the first caller becomes the leader and runs the work inline, every
//! later caller joins the flight and receives the leader's result.
//!
//! ## Mechanism
//! - **Leader**: inserts the call entry, runs the work, publishes the result
//!   and then removes the entry, so each burst of callers shares exactly one
//!   execution and later bursts load fresh.
//! - **Joiners**: wait on a per-call barrier without holding the map lock,
//!   so flights for different keys never serialize each other.
//! - **Unwind safety**: if the leader aborts (panic or cancellation), a drop
//!   guard publishes an error and releases the waiters.

pub mod coalesce;
