//! Saving and restoring a network table.
//!
//! Only segments are persisted: position, medium, tier, connection mask and
//! the amount each one holds. Networked segments store their capacity share
//! of the pool. Membership is not saved; loading restores every segment as
//! an orphan and the next reattachment rebuilds the same networks with the
//! same totals.

use std::collections::BTreeMap;

use gridflow_core::container::ContainerError;
use gridflow_core::position::Position;
use gridflow_core::serialize::{
    ContainerRecord, DeserializeError, SerializeError, SnapshotHeader, decode, encode,
};
use gridflow_core::stack::ResourceStack;
use gridflow_core::topology::Medium;
use serde::{Deserialize, Serialize};

use crate::config::NetworkConfig;
use crate::graph::{NetworkError, NetworkTable};
use crate::segment::{ConnectionType, SegmentSpec};
use crate::share::apportion;
use crate::tier::Tier;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
    #[error("segment at {position:?}: {source}")]
    Segment {
        position: Position,
        source: NetworkError,
    },
    #[error("segment at {position:?}: {source}")]
    Contents {
        position: Position,
        source: ContainerError,
    },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The persisted form of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub position: Position,
    pub medium: Medium,
    pub tier: Tier,
    pub connections: [ConnectionType; 6],
    pub contents: ContainerRecord,
}

/// A whole table, segments in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub header: SnapshotHeader,
    pub segments: Vec<SegmentRecord>,
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

impl NetworkTable {
    /// Capture the table without changing it.
    pub fn snapshot(&self) -> GridSnapshot {
        let mut held: Vec<ResourceStack> = Vec::new();
        let mut index = BTreeMap::new();
        for (i, (id, _)) in self.segments().enumerate() {
            index.insert(id, i);
            held.push(ResourceStack::EMPTY);
        }

        for (id, segment) in self.segments() {
            if segment.is_orphan() {
                if let Some(&i) = index.get(&id) {
                    held[i] = segment.buffer().stack();
                }
            }
        }
        for network in self.networks() {
            let members = self.by_position_order(network.members());
            let capacities: Vec<u64> = members
                .iter()
                .filter_map(|m| self.segment(*m))
                .map(|s| s.capacity())
                .collect();
            let stack = network.pooled().stack();
            let shares = apportion(stack.amount, &capacities);
            for (member, share) in members.iter().zip(shares) {
                if let Some(&i) = index.get(member) {
                    held[i] = stack.with_amount(share);
                }
            }
        }

        let segments = self
            .segments()
            .zip(held)
            .map(|((_, segment), stack)| SegmentRecord {
                position: segment.position(),
                medium: segment.medium(),
                tier: segment.tier(),
                connections: segment.connections(),
                contents: ContainerRecord::from_stack(&stack),
            })
            .collect();
        GridSnapshot {
            header: SnapshotHeader::new(self.tick()),
            segments,
        }
    }

    /// Serialize the table to bytes.
    pub fn save(&self) -> Result<Vec<u8>, SerializeError> {
        encode(&self.snapshot())
    }

    /// Rebuild a table from a snapshot. Every segment comes back as an
    /// orphan holding its saved amount.
    pub fn restore(snapshot: &GridSnapshot, config: NetworkConfig) -> Result<Self, LoadError> {
        snapshot.header.validate()?;
        let mut table = NetworkTable::new(config);
        table.set_tick(snapshot.header.tick);
        for record in &snapshot.segments {
            let spec = SegmentSpec {
                position: record.position,
                medium: record.medium,
                tier: record.tier,
                connections: record.connections,
            };
            let id = table
                .place_segment(spec)
                .map_err(|source| LoadError::Segment {
                    position: record.position,
                    source,
                })?;
            table
                .restore_buffer(id, record.contents.to_stack())
                .map_err(|source| LoadError::Contents {
                    position: record.position,
                    source,
                })?;
        }
        log::debug!(
            "restored {} segments at tick {}",
            snapshot.segments.len(),
            snapshot.header.tick
        );
        Ok(table)
    }

    /// Deserialize bytes produced by [`save`](Self::save).
    pub fn load(data: &[u8], config: NetworkConfig) -> Result<Self, LoadError> {
        let snapshot: GridSnapshot = decode(data)?;
        Self::restore(&snapshot, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridflow_core::action::Action;
    use gridflow_core::position::Direction;
    use gridflow_core::serialize::FORMAT_VERSION;
    use gridflow_core::test_utils::*;
    use gridflow_core::topology::CapabilityRegistry;

    fn pipe(at: Position) -> SegmentSpec {
        SegmentSpec::new(at, Medium::Fluid, Tier::Basic)
    }

    fn sample_table() -> NetworkTable {
        let mut table = NetworkTable::default();
        let ids: Vec<_> = line(3)
            .into_iter()
            .map(|p| table.place_segment(pipe(p)).unwrap())
            .collect();
        table
            .place_segment(
                SegmentSpec::new(pos(5, 0, 0), Medium::Chemical, Tier::Elite)
                    .with_connection(Direction::Up, ConnectionType::Pull),
            )
            .unwrap();
        table.reattach_orphans(&CapabilityRegistry::new());
        table.insert_into(ids[1], stack(water(), 4_001), Action::Execute).unwrap();
        table.set_tick(77);
        table
    }

    #[test]
    fn snapshot_splits_pool_by_capacity() {
        let snapshot = sample_table().snapshot();
        assert_eq!(snapshot.header.tick, 77);
        assert_eq!(snapshot.segments.len(), 4);
        let amounts: Vec<u64> = snapshot.segments.iter().map(|s| s.contents.amount).collect();
        // Three equal pipes, then the tube. The two leftover units go to
        // the first pipe.
        assert_eq!(amounts, vec![1_335, 1_333, 1_333, 0]);
        assert_eq!(amounts.iter().sum::<u64>(), 4_001);
    }

    #[test]
    fn load_restores_orphans_then_rebuilds_networks() {
        let table = sample_table();
        let bytes = table.save().unwrap();
        let mut restored = NetworkTable::load(&bytes, NetworkConfig::default()).unwrap();
        assert_eq!(restored.tick(), 77);
        assert_eq!(restored.segment_count(), 4);
        assert_eq!(restored.network_count(), 0);
        assert_eq!(restored.total_stored(), 4_001);

        restored.reattach_orphans(&CapabilityRegistry::new());
        assert_eq!(restored.network_count(), 2);
        let first = restored.segment_at(pos(0, 0, 0)).unwrap();
        assert_eq!(restored.contents(first), stack(water(), 4_001));
        let tube = restored.segment_at(pos(5, 0, 0)).unwrap();
        assert_eq!(
            restored.segment(tube).unwrap().connection(Direction::Up),
            ConnectionType::Pull
        );
    }

    #[test]
    fn reserialize_is_byte_identical() {
        let bytes = sample_table().save().unwrap();
        let restored = NetworkTable::load(&bytes, NetworkConfig::default()).unwrap();
        assert_eq!(restored.save().unwrap(), bytes);

        let mut rebuilt = restored;
        rebuilt.reattach_orphans(&CapabilityRegistry::new());
        assert_eq!(rebuilt.save().unwrap(), bytes);
    }

    #[test]
    fn bad_header_is_rejected() {
        let mut snapshot = sample_table().snapshot();
        snapshot.header.version = FORMAT_VERSION + 1;
        let bytes = encode(&snapshot).unwrap();
        assert!(matches!(
            NetworkTable::load(&bytes, NetworkConfig::default()),
            Err(LoadError::Deserialize(DeserializeError::FutureVersion(_)))
        ));
    }

    #[test]
    fn contents_over_capacity_are_rejected() {
        let snapshot = sample_table().snapshot();
        let mut config = NetworkConfig::default();
        config.fluid.basic.capacity = 100;
        assert!(matches!(
            NetworkTable::restore(&snapshot, config),
            Err(LoadError::Contents { .. })
        ));
    }
}
