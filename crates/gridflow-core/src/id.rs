use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a transmitter segment in the network table.
    pub struct SegmentId;

    /// Identifies a resource network in the network table.
    pub struct NetworkId;

    /// Identifies an acceptor (tank, machine, battery) in a capability registry.
    pub struct AcceptorId;

    /// Identifies a thermal participant in the heat module.
    pub struct HeatNodeId;
}

/// Identifies a resource type (a fluid, a chemical, energy). Cheap to copy
/// and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceTypeId(pub u32);

impl ResourceTypeId {
    /// Placeholder type carried by the empty stack. Never a real resource.
    pub const NONE: ResourceTypeId = ResourceTypeId(u32::MAX);
}

/// Identifies a multiblock structure (boiler, tank) that thermal
/// participants may belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MultiblockId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_id_equality() {
        let a = ResourceTypeId(0);
        let b = ResourceTypeId(0);
        let c = ResourceTypeId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, ResourceTypeId::NONE);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ResourceTypeId(0), "water");
        map.insert(ResourceTypeId(1), "lava");
        assert_eq!(map[&ResourceTypeId(1)], "lava");
    }

    #[test]
    fn slot_keys_are_ordered() {
        use slotmap::SlotMap;
        let mut sm = SlotMap::<SegmentId, ()>::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        assert!(a < b);
    }
}
