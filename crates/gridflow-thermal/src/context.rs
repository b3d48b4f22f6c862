//! Which multiblocks are currently hot.
//!
//! One context exists per simulated world. It is created when the world
//! loads, cleared when it unloads and passed to
//! [`HeatModule::tick`](crate::module::HeatModule::tick) so members can
//! refresh their activity.

use std::collections::BTreeMap;

use gridflow_core::id::MultiblockId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeatContext {
    hot: BTreeMap<MultiblockId, bool>,
}

impl HeatContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hot(&mut self, multiblock: MultiblockId, hot: bool) {
        self.hot.insert(multiblock, hot);
    }

    /// Unknown multiblocks are cold.
    pub fn is_hot(&self, multiblock: MultiblockId) -> bool {
        self.hot.get(&multiblock).copied().unwrap_or(false)
    }

    /// Forget a multiblock, e.g. when a member leaves it.
    pub fn remove(&mut self, multiblock: MultiblockId) -> Option<bool> {
        self.hot.remove(&multiblock)
    }

    pub fn clear(&mut self) {
        self.hot.clear();
    }

    pub fn len(&self) -> usize {
        self.hot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hot.is_empty()
    }
}
