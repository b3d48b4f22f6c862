//! Binary persistence primitives.
//!
//! Snapshots are `bitcode`-encoded and start with a [`SnapshotHeader`] so a
//! reader can reject foreign or incompatible data before trusting the
//! payload. The network crate builds its grid snapshot on top of these.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::id::ResourceTypeId;
use crate::stack::ResourceStack;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Gridflow snapshot ("GRID").
pub const SNAPSHOT_MAGIC: u32 = 0x4752_4944;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic number for format detection.
    pub magic: u32,
    /// Format version for forward compatibility.
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Container record
// ---------------------------------------------------------------------------

/// The persisted contents of one container: a resource id and an amount.
///
/// An empty container is stored with no resource and amount 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub resource: Option<ResourceTypeId>,
    pub amount: u64,
}

impl ContainerRecord {
    pub fn from_stack(stack: &ResourceStack) -> Self {
        Self {
            resource: stack.resource_type(),
            amount: stack.amount,
        }
    }

    /// Rebuild the stack. A record with no resource is empty whatever its
    /// amount says.
    pub fn to_stack(&self) -> ResourceStack {
        match self.resource {
            Some(resource) => ResourceStack::new(resource, self.amount),
            None => ResourceStack::EMPTY,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// Encode any serde value with bitcode.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SerializeError> {
    bitcode::serialize(value).map_err(|e| SerializeError::Encode(e.to_string()))
}

/// Decode a bitcode payload produced by [`encode`].
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, DeserializeError> {
    bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
}
