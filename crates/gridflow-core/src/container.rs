//! Bounded single-stack resource storage.
//!
//! A [`ResourceContainer`] holds at most one [`ResourceStack`] up to a fixed
//! capacity. Insertion and extraction follow the simulate/execute protocol
//! and every call that changes the stored contents bumps the container's
//! revision and notifies its [`ContentsListener`] exactly once.

use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::id::ResourceTypeId;
use crate::serialize::ContainerRecord;
use crate::stack::ResourceStack;

/// Largest capacity a container can have. Keeps signed deltas exact.
pub const MAX_CAPACITY: u64 = i64::MAX as u64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from overwriting a container's contents directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    #[error("amount {amount} exceeds capacity {capacity}")]
    OverCapacity { amount: u64, capacity: u64 },
    #[error("resource {0:?} is not valid for this container")]
    InvalidResource(ResourceTypeId),
}

// ---------------------------------------------------------------------------
// Validity predicate
// ---------------------------------------------------------------------------

/// Which stacks a container may ever hold.
///
/// The filter only looks at the offered stack, never at the container's
/// current contents or fill level.
#[derive(Debug, Clone)]
pub enum ResourceFilter {
    /// Every resource is valid.
    Any,
    /// Nothing is valid (a sealed container).
    Never,
    /// Exactly one resource type is valid.
    Only(ResourceTypeId),
    /// Any of the listed resource types is valid.
    AnyOf(Vec<ResourceTypeId>),
    /// A caller-supplied pure predicate.
    Predicate(fn(&ResourceStack) -> bool),
}

impl ResourceFilter {
    pub fn accepts(&self, stack: &ResourceStack) -> bool {
        if stack.is_empty() {
            return false;
        }
        match self {
            ResourceFilter::Any => true,
            ResourceFilter::Never => false,
            ResourceFilter::Only(id) => stack.resource == *id,
            ResourceFilter::AnyOf(ids) => ids.contains(&stack.resource),
            ResourceFilter::Predicate(f) => f(stack),
        }
    }
}

// ---------------------------------------------------------------------------
// Change notification
// ---------------------------------------------------------------------------

/// Observer told about every change to a container's stored contents.
pub trait ContentsListener: Send + Sync {
    fn on_contents_changed(&self, stack: &ResourceStack);
}

// ---------------------------------------------------------------------------
// ResourceContainer
// ---------------------------------------------------------------------------

/// A bounded mutable store of one resource stack.
///
/// Invariants: `stored() <= capacity()`, and a non-empty stack always
/// satisfies the container's [`ResourceFilter`].
#[derive(Clone)]
pub struct ResourceContainer {
    stack: ResourceStack,
    capacity: u64,
    filter: ResourceFilter,
    /// Number of content changes since creation.
    revision: u64,
    listener: Option<Arc<dyn ContentsListener>>,
}

impl fmt::Debug for ResourceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContainer")
            .field("stack", &self.stack)
            .field("capacity", &self.capacity)
            .field("filter", &self.filter)
            .field("revision", &self.revision)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl ResourceContainer {
    /// Create an empty container. Capacity is clamped to [`MAX_CAPACITY`].
    pub fn new(capacity: u64, filter: ResourceFilter) -> Self {
        Self {
            stack: ResourceStack::EMPTY,
            capacity: capacity.min(MAX_CAPACITY),
            filter,
            revision: 0,
            listener: None,
        }
    }

    /// Attach a listener, replacing any previous one.
    pub fn with_listener(mut self, listener: Arc<dyn ContentsListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn set_listener(&mut self, listener: Option<Arc<dyn ContentsListener>>) {
        self.listener = listener;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// A copy of the stored stack.
    pub fn stack(&self) -> ResourceStack {
        self.stack
    }

    pub fn stored(&self) -> u64 {
        self.stack.amount
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Free space left before the container is full.
    pub fn needed(&self) -> u64 {
        self.capacity.saturating_sub(self.stack.amount)
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn resource_type(&self) -> Option<ResourceTypeId> {
        self.stack.resource_type()
    }

    pub fn filter(&self) -> &ResourceFilter {
        &self.filter
    }

    /// Whether the container could ever hold `stack`, ignoring its contents.
    pub fn is_valid(&self, stack: &ResourceStack) -> bool {
        self.filter.accepts(stack)
    }

    pub fn is_type_equal(&self, stack: &ResourceStack) -> bool {
        self.stack.is_type_equal(stack)
    }

    /// Number of content changes since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Single write path: every content change goes through here.
    fn replace(&mut self, stack: ResourceStack) {
        if stack == self.stack {
            return;
        }
        self.stack = stack;
        self.revision += 1;
        if let Some(listener) = &self.listener {
            listener.on_contents_changed(&self.stack);
        }
    }

    /// Overwrite the contents. The stack must fit and pass the filter.
    pub fn set_stack(&mut self, stack: ResourceStack) -> Result<(), ContainerError> {
        if stack.amount > self.capacity {
            return Err(ContainerError::OverCapacity {
                amount: stack.amount,
                capacity: self.capacity,
            });
        }
        if !stack.is_empty() && !self.is_valid(&stack) {
            return Err(ContainerError::InvalidResource(stack.resource));
        }
        self.replace(stack);
        Ok(())
    }

    pub fn set_empty(&mut self) {
        self.replace(ResourceStack::EMPTY);
    }

    /// Insert `stack` and return what did not fit.
    ///
    /// The full input comes back unchanged if it is empty, fails the filter,
    /// the container is full, or the container holds a different type.
    pub fn insert(&mut self, stack: ResourceStack, action: Action) -> ResourceStack {
        if stack.is_empty() || !self.is_valid(&stack) {
            return stack;
        }
        let needed = self.needed();
        if needed == 0 {
            return stack;
        }
        let same_type = self.is_type_equal(&stack);
        if self.is_empty() || same_type {
            let to_add = stack.amount.min(needed);
            if action.execute() {
                if same_type {
                    self.grow(to_add as i64, action);
                } else {
                    self.replace(stack.with_amount(to_add));
                }
            }
            return stack.with_amount(stack.amount - to_add);
        }
        stack
    }

    /// Extract up to `amount` of whatever is stored.
    pub fn extract(&mut self, amount: u64, action: Action) -> ResourceStack {
        if self.is_empty() || amount < 1 {
            return ResourceStack::EMPTY;
        }
        let extracted = self.stack.with_amount(self.stack.amount.min(amount));
        if !extracted.is_empty() && action.execute() {
            self.shrink(extracted.amount as i64, action);
        }
        extracted
    }

    /// Extract up to `amount`, but only if the stored type is `resource`.
    pub fn extract_matching(
        &mut self,
        resource: ResourceTypeId,
        amount: u64,
        action: Action,
    ) -> ResourceStack {
        if self.stack.resource_type() != Some(resource) {
            return ResourceStack::EMPTY;
        }
        self.extract(amount, action)
    }

    /// Resize the stored stack, clamped to `[0, capacity]`. Returns the
    /// size the stack has (or would have, under `Simulate`).
    ///
    /// An empty container has no type to resize and always reports 0.
    pub fn set_size(&mut self, amount: u64, action: Action) -> u64 {
        if self.is_empty() {
            return 0;
        }
        if amount == 0 {
            if action.execute() {
                self.set_empty();
            }
            return 0;
        }
        let amount = amount.min(self.capacity);
        if self.stack.amount == amount || action.simulate() {
            return amount;
        }
        self.replace(self.stack.with_amount(amount));
        amount
    }

    /// Grow the stored stack by a signed delta. Negative values shrink it.
    /// Returns how much the stack actually grew.
    pub fn grow(&mut self, delta: i64, action: Action) -> i64 {
        let current = self.stack.amount as i64;
        let target = current.saturating_add(delta);
        let new_size = if target <= 0 {
            self.set_size(0, action)
        } else {
            self.set_size(target as u64, action)
        };
        new_size as i64 - current
    }

    /// Shrink the stored stack by a signed delta; the mirror of [`grow`].
    ///
    /// Returns how much the stack actually shrank.
    ///
    /// [`grow`]: ResourceContainer::grow
    pub fn shrink(&mut self, delta: i64, action: Action) -> i64 {
        -self.grow(delta.saturating_neg(), action)
    }

    /// Change the capacity. Contents that no longer fit are removed and
    /// returned.
    pub fn set_capacity(&mut self, capacity: u64) -> ResourceStack {
        self.capacity = capacity.min(MAX_CAPACITY);
        if self.stack.amount <= self.capacity {
            return ResourceStack::EMPTY;
        }
        let overflow = self.stack.with_amount(self.stack.amount - self.capacity);
        self.replace(self.stack.with_amount(self.capacity));
        overflow
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// The persisted form of the contents.
    pub fn record(&self) -> ContainerRecord {
        ContainerRecord::from_stack(&self.stack)
    }

    /// Restore contents from a record.
    pub fn load_record(&mut self, record: &ContainerRecord) -> Result<(), ContainerError> {
        self.set_stack(record.to_stack())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn insert_over_capacity_returns_remainder() {
        let mut c = tank(1000);
        let remainder = c.insert(ResourceStack::new(water(), 1500), Action::Execute);
        assert_eq!(remainder, ResourceStack::new(water(), 500));
        assert_eq!(c.stored(), 1000);
        assert_eq!(c.resource_type(), Some(water()));
    }

    #[test]
    fn simulate_insert_leaves_contents() {
        let mut c = tank(1000);
        let remainder = c.insert(ResourceStack::new(water(), 300), Action::Simulate);
        assert!(remainder.is_empty());
        assert!(c.is_empty());
        assert_eq!(c.revision(), 0);
    }

    #[test]
    fn insert_rejects_other_type() {
        let mut c = tank(1000);
        c.insert(ResourceStack::new(water(), 10), Action::Execute);
        let lava_in = ResourceStack::new(lava(), 10);
        assert_eq!(c.insert(lava_in, Action::Execute), lava_in);
        assert_eq!(c.stack(), ResourceStack::new(water(), 10));
    }

    #[test]
    fn insert_rejects_filtered_type() {
        let mut c = ResourceContainer::new(100, ResourceFilter::Only(lava()));
        let offered = ResourceStack::new(water(), 10);
        assert_eq!(c.insert(offered, Action::Execute), offered);
        assert!(c.is_empty());

        let mut sealed = ResourceContainer::new(100, ResourceFilter::Never);
        assert_eq!(sealed.insert(offered, Action::Execute), offered);
    }

    #[test]
    fn predicate_filter_is_consulted() {
        fn small_ids(stack: &ResourceStack) -> bool {
            stack.resource.0 < 2
        }
        let mut c = ResourceContainer::new(100, ResourceFilter::Predicate(small_ids));
        assert!(c.insert(ResourceStack::new(water(), 5), Action::Execute).is_empty());
        let big = ResourceStack::new(hydrogen(), 5);
        assert_eq!(c.insert(big, Action::Simulate), big);
    }

    #[test]
    fn insert_into_full_container_returns_input() {
        let mut c = tank(10);
        c.insert(ResourceStack::new(water(), 10), Action::Execute);
        let more = ResourceStack::new(water(), 3);
        assert_eq!(c.insert(more, Action::Execute), more);
        assert_eq!(c.revision(), 1);
    }

    #[test]
    fn insert_empty_stack_is_noop() {
        let mut c = tank(10);
        assert!(c.insert(ResourceStack::EMPTY, Action::Execute).is_empty());
        assert_eq!(c.revision(), 0);
    }

    #[test]
    fn extract_partial_and_full() {
        let mut c = tank(100);
        c.insert(ResourceStack::new(water(), 40), Action::Execute);

        let got = c.extract(15, Action::Execute);
        assert_eq!(got, ResourceStack::new(water(), 15));
        assert_eq!(c.stored(), 25);

        let rest = c.extract(1000, Action::Execute);
        assert_eq!(rest, ResourceStack::new(water(), 25));
        assert!(c.is_empty());
    }

    #[test]
    fn extract_zero_or_from_empty_returns_empty() {
        let mut c = tank(100);
        assert!(c.extract(5, Action::Execute).is_empty());
        c.insert(ResourceStack::new(water(), 5), Action::Execute);
        assert!(c.extract(0, Action::Execute).is_empty());
        assert_eq!(c.stored(), 5);
    }

    #[test]
    fn simulate_extract_leaves_contents() {
        let mut c = tank(100);
        c.insert(ResourceStack::new(water(), 40), Action::Execute);
        assert_eq!(c.extract(30, Action::Simulate).amount, 30);
        assert_eq!(c.stored(), 40);
    }

    #[test]
    fn extract_matching_checks_type() {
        let mut c = tank(100);
        c.insert(ResourceStack::new(water(), 40), Action::Execute);
        assert!(c.extract_matching(lava(), 10, Action::Execute).is_empty());
        assert_eq!(c.extract_matching(water(), 10, Action::Execute).amount, 10);
    }

    #[test]
    fn set_size_clamps_and_empties() {
        let mut c = tank(100);
        assert_eq!(c.set_size(50, Action::Execute), 0, "empty has no type");
        c.insert(ResourceStack::new(water(), 10), Action::Execute);

        assert_eq!(c.set_size(500, Action::Simulate), 100);
        assert_eq!(c.stored(), 10);

        assert_eq!(c.set_size(500, Action::Execute), 100);
        assert_eq!(c.stored(), 100);

        assert_eq!(c.set_size(0, Action::Execute), 0);
        assert!(c.is_empty());
    }

    #[test]
    fn grow_and_shrink_are_mirrors() {
        let mut a = tank(100);
        a.insert(ResourceStack::new(water(), 50), Action::Execute);
        let mut b = a.clone();

        for x in [-200_i64, -50, -1, 0, 1, 30, 70, 500] {
            assert_eq!(
                a.shrink(x, Action::Simulate),
                -b.grow(-x, Action::Simulate),
                "x = {x}"
            );
        }
        assert_eq!(a.shrink(20, Action::Execute), 20);
        assert_eq!(b.grow(-20, Action::Execute), -20);
        assert_eq!(a.stack(), b.stack());
    }

    #[test]
    fn grow_is_capped_at_capacity() {
        let mut c = tank(100);
        c.insert(ResourceStack::new(water(), 90), Action::Execute);
        assert_eq!(c.grow(50, Action::Execute), 10);
        assert_eq!(c.grow(-500, Action::Execute), -100);
        assert!(c.is_empty());
    }

    #[test]
    fn every_change_notifies_exactly_once() {
        let listener = Arc::new(CountingListener::default());
        let mut c = tank(100).with_listener(listener.clone());

        c.insert(ResourceStack::new(water(), 30), Action::Execute);
        assert_eq!(listener.count(), 1);
        c.insert(ResourceStack::new(water(), 30), Action::Execute);
        assert_eq!(listener.count(), 2);
        c.extract(10, Action::Execute);
        assert_eq!(listener.count(), 3);
        c.grow(5, Action::Execute);
        assert_eq!(listener.count(), 4);
        c.extract(1000, Action::Execute);
        assert_eq!(listener.count(), 5);
        assert_eq!(c.revision(), 5);
    }

    #[test]
    fn no_change_means_no_notification() {
        let listener = Arc::new(CountingListener::default());
        let mut c = tank(100).with_listener(listener.clone());
        c.insert(ResourceStack::new(water(), 100), Action::Execute);

        c.insert(ResourceStack::new(water(), 1), Action::Execute);
        c.insert(ResourceStack::new(water(), 1), Action::Simulate);
        c.extract(10, Action::Simulate);
        c.set_size(100, Action::Execute);
        c.grow(0, Action::Execute);
        assert_eq!(listener.count(), 1);
        assert_eq!(listener.last(), Some(ResourceStack::new(water(), 100)));
    }

    #[test]
    fn set_stack_validates() {
        let mut c = ResourceContainer::new(100, ResourceFilter::Only(water()));
        assert_eq!(
            c.set_stack(ResourceStack::new(water(), 101)),
            Err(ContainerError::OverCapacity {
                amount: 101,
                capacity: 100
            })
        );
        assert_eq!(
            c.set_stack(ResourceStack::new(lava(), 1)),
            Err(ContainerError::InvalidResource(lava()))
        );
        assert!(c.set_stack(ResourceStack::new(water(), 100)).is_ok());
        assert!(c.set_stack(ResourceStack::EMPTY).is_ok());
        assert!(c.is_empty());
    }

    #[test]
    fn shrinking_capacity_returns_overflow() {
        let mut c = tank(100);
        c.insert(ResourceStack::new(water(), 80), Action::Execute);
        assert!(c.set_capacity(200).is_empty());
        assert_eq!(c.set_capacity(50), ResourceStack::new(water(), 30));
        assert_eq!(c.stored(), 50);
        assert_eq!(c.capacity(), 50);
    }

    #[test]
    fn record_round_trip() {
        let mut c = tank(100);
        c.insert(ResourceStack::new(lava(), 42), Action::Execute);
        let record = c.record();

        let mut restored = tank(100);
        restored.load_record(&record).unwrap();
        assert_eq!(restored.stack(), c.stack());
        assert_eq!(restored.record(), record);
    }
}
