//! Gridflow Network -- transmitter networks that pool and distribute
//! resources.
//!
//! Adjacent transmitter segments (pipes, tubes, cables) of the same medium
//! link into networks. Each network pools its members' buffers into one
//! container whose capacity is the sum of theirs, and every tick the
//! [`DistributionScheduler`] pulls from acceptors on `Pull` sides and pushes
//! the pool into acceptors on `Normal` sides.
//!
//! # Lifecycle
//!
//! - A placed segment starts as an orphan.
//! - Once per tick, orphans join the first compatible neighbouring network,
//!   bridge any further compatible ones into it, or form a new network with
//!   the orphans connected to them.
//! - Removing a segment or closing a side re-splits the network into its
//!   connected components, apportioning the pool by capacity share.
//! - Networks holding different resources never merge; the segment that
//!   tried is told so through [`NetworkEvent::ConnectionFailed`] and keeps
//!   working against its own buffer.
//!
//! ```rust
//! use gridflow_core::action::Action;
//! use gridflow_core::position::Position;
//! use gridflow_core::id::ResourceTypeId;
//! use gridflow_core::stack::ResourceStack;
//! use gridflow_core::topology::{CapabilityRegistry, Medium};
//! use gridflow_network::{DistributionScheduler, NetworkTable, SegmentSpec, Tier};
//!
//! let mut table = NetworkTable::default();
//! let mut world = CapabilityRegistry::new();
//! let a = table.place_segment(SegmentSpec::new(Position::new(0, 0, 0), Medium::Fluid, Tier::Basic)).unwrap();
//! table.place_segment(SegmentSpec::new(Position::new(1, 0, 0), Medium::Fluid, Tier::Basic)).unwrap();
//! table.insert_into(a, ResourceStack::new(ResourceTypeId(0), 1500), Action::Execute).unwrap();
//!
//! let mut scheduler = DistributionScheduler::new();
//! scheduler.step(&mut table, &mut world);
//!
//! let network = table.network_of(a).unwrap();
//! assert_eq!(network.len(), 2);
//! assert_eq!(network.pooled().capacity(), 4000);
//! assert_eq!(network.pooled().stored(), 1500);
//! ```

pub mod config;
pub mod event;
pub mod graph;
pub mod persist;
pub mod scheduler;
pub mod segment;
pub mod share;
pub mod tier;

pub use config::{MediumTiers, NetworkConfig, TierSpec};
pub use event::NetworkEvent;
pub use graph::{FlowStats, MergeError, Neighbor, Network, NetworkError, NetworkTable};
pub use persist::{GridSnapshot, LoadError, SegmentRecord};
pub use scheduler::DistributionScheduler;
pub use segment::{ConnectionType, SegmentSpec, TransmitterSegment};
pub use tier::Tier;
