//! Gridflow Core -- shared building blocks for resource-network simulation.
//!
//! This crate holds the value types and storage primitives that the network
//! and thermal crates are built from: identifiers, block positions and
//! directions, deterministic fixed-point arithmetic, resource stacks, bounded
//! resource containers, the acceptor/topology boundary, versioned snapshot
//! records, and config-file loading.
//!
//! # Simulate / Execute
//!
//! Every operation that moves resources takes an [`action::Action`]. Under
//! `Simulate` the call reports what *would* happen and leaves all state
//! untouched; under `Execute` it commits. Callers probe with `Simulate`
//! first and only commit when both sides of a transfer agree:
//!
//! ```rust
//! use gridflow_core::action::Action;
//! use gridflow_core::container::{ResourceContainer, ResourceFilter};
//! use gridflow_core::id::ResourceTypeId;
//! use gridflow_core::stack::ResourceStack;
//!
//! let mut tank = ResourceContainer::new(1000, ResourceFilter::Any);
//! let water = ResourceStack::new(ResourceTypeId(0), 1500);
//!
//! let remainder = tank.insert(water, Action::Simulate);
//! assert_eq!(remainder.amount, 500);
//! assert!(tank.is_empty());
//!
//! tank.insert(water, Action::Execute);
//! assert_eq!(tank.stored(), 1000);
//! ```
//!
//! # Key Types
//!
//! - [`stack::ResourceStack`] -- `Copy` value of (resource type, amount).
//! - [`container::ResourceContainer`] -- bounded store with insert/extract
//!   arithmetic and change notification.
//! - [`topology::Topology`] -- the world oracle the simulation queries.
//! - [`topology::CapabilityRegistry`] -- in-memory acceptor registry keyed by
//!   position, face and medium.
//! - [`serialize::SnapshotHeader`] -- versioned header for persisted state.

pub mod action;
pub mod config;
pub mod container;
pub mod fixed;
pub mod id;
pub mod position;
pub mod serialize;
pub mod stack;
pub mod topology;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
