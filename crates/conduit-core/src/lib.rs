//! Conduit Core -- pipe networks that move items, fluids, and energy
//! between containers on a block grid.
//!
//! Pipes of one resource type that touch face-to-face form a network.
//! Containers adjacent to member pipes are its endpoints; an endpoint
//! configured as an output pushes, a retriever pulls, and an input only
//! receives.
//!
//! # Twenty-Step Cycle
//!
//! Each network spreads its work over a cycle of [`sim::CYCLE_LENGTH`]
//! steps:
//!
//! 1. **Build** (step 0 of the cycle) -- Snapshot one work item per loaded
//!    container-bearing pipe and compute the per-step share.
//! 2. **Drain** (steps 1 to 18) -- Service up to the share of work items.
//! 3. **Finish** (step 19) -- Service whatever is left.
//!
//! Every container-bearing pipe is therefore serviced exactly once per
//! cycle, and no step pays for more than its share.
//!
//! # Graph Maintenance
//!
//! Placing a pipe joins, merges or creates networks immediately; breaking
//! one may split its network. Chunk loads and container changes are
//! queued with [`state::NetworkState::queue_update`] and reconciled in one
//! batch at the start of the next step.
//!
//! # Key Types
//!
//! - [`hooks::TransportNetworks`] -- Host entry points, one registry per type.
//! - [`state::NetworkState`] -- Networks of one type plus endpoint config.
//! - [`network::Network`] -- One connected component and its work list.
//! - [`routing::RoutingMode`] -- How an endpoint orders its targets.
//! - [`world::World`] / [`world::Storage`] -- What the host must provide.
//! - [`config::TransferConfig`] -- Per-tier transfer rates.

pub mod config;
pub mod endpoint;
pub mod event;
pub mod grid;
pub mod hooks;
pub mod id;
pub mod network;
pub mod node;
pub mod rng;
pub mod routing;
pub mod scheduler;
pub mod sim;
pub mod state;
pub mod transfer;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
