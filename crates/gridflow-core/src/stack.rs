use serde::{Deserialize, Serialize};

use crate::id::ResourceTypeId;

/// An amount of one resource type.
///
/// Stacks are plain values: every container hands out copies, so callers can
/// never mutate a container's contents through a returned stack. A stack with
/// zero amount is always the [`ResourceStack::EMPTY`] sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceStack {
    pub resource: ResourceTypeId,
    pub amount: u64,
}

impl Default for ResourceStack {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl ResourceStack {
    pub const EMPTY: ResourceStack = ResourceStack {
        resource: ResourceTypeId::NONE,
        amount: 0,
    };

    /// Create a stack. A zero amount yields [`ResourceStack::EMPTY`].
    pub fn new(resource: ResourceTypeId, amount: u64) -> Self {
        if amount == 0 || resource == ResourceTypeId::NONE {
            Self::EMPTY
        } else {
            Self { resource, amount }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// A stack of the same type with a different amount.
    pub fn with_amount(&self, amount: u64) -> Self {
        Self::new(self.resource, amount)
    }

    /// The resource type, or `None` for the empty stack.
    pub fn resource_type(&self) -> Option<ResourceTypeId> {
        if self.is_empty() {
            None
        } else {
            Some(self.resource)
        }
    }

    /// True if both stacks are non-empty and hold the same resource type.
    pub fn is_type_equal(&self, other: &ResourceStack) -> bool {
        !self.is_empty() && !other.is_empty() && self.resource == other.resource
    }

    /// True if the two stacks could share a container: either is empty or
    /// both hold the same resource type.
    pub fn is_compatible(&self, other: &ResourceStack) -> bool {
        self.is_empty() || other.is_empty() || self.resource == other.resource
    }
}
