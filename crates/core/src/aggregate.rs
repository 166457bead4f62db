//! Versioned aggregate roots and optimistic concurrency expectations.

use crate::entity::Entity;

/// An entity whose mutations are guarded by a monotonically increasing version.
///
/// Inventory items are the only aggregate today: every quantity change and every
/// catalog edit bumps the version, so a writer that read version `n` can detect
/// that someone else committed in between.
pub trait AggregateRoot: Entity {
    /// Version of the state this instance was read at.
    fn version(&self) -> u64;

    /// Expectation to attach to a write derived from this snapshot.
    fn expected_version(&self) -> ExpectedVersion {
        ExpectedVersion::Exact(self.version())
    }
}

/// Optimistic concurrency expectation for an aggregate write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (catalog deletes issued by an operator, migrations, etc.).
    Any,
    /// Require the stored aggregate to still be at this exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}
