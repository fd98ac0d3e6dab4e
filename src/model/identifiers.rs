//! Identifier newtypes and arena handles.
//!
//! String identifiers come from producers; handles (`*Key`, `*Index`,
//! `*Id`) are positions in append-only arenas and stay valid for the life
//! of the model.

use std::fmt;

/// Namespace applied to every thread id read from one ingestion source.
///
/// The unscoped group leaves ids untouched; it is used for replaying a saved
/// journal, whose ids are already qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceGroup(String);

impl SourceGroup {
    /// Smart constructor: non-empty, no `/`.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidSourceGroup> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidSourceGroup::Empty);
        }
        if raw.contains('/') {
            return Err(InvalidSourceGroup::Separator(raw));
        }
        Ok(Self(raw))
    }

    /// The `n`th group handed out by a model (`g1`, `g2`, ...).
    pub(crate) fn sequential(n: u64) -> Self {
        Self(format!("g{}", n))
    }

    /// Sequence number of a `gN` tag, if it is one.
    pub(crate) fn sequence_number(tag: &str) -> Option<u64> {
        tag.strip_prefix('g')?.parse().ok()
    }

    /// Group that applies no prefix.
    pub fn unscoped() -> Self {
        Self(String::new())
    }

    /// Whether this is the unscoped group.
    pub fn is_unscoped(&self) -> bool {
        self.0.is_empty()
    }

    /// Group tag as text (empty when unscoped).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify a raw thread id as `group/id`.
    pub fn qualify(&self, raw: &str) -> LifelineId {
        if self.is_unscoped() {
            LifelineId(raw.to_string())
        } else {
            LifelineId(format!("{}/{}", self.0, raw))
        }
    }
}

impl fmt::Display for SourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unscoped() {
            f.write_str("<unscoped>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Qualified lifeline identifier (`group/threadid`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LifelineId(String);

impl LifelineId {
    /// Wrap an already-qualified id.
    pub fn new(qualified: impl Into<String>) -> Self {
        Self(qualified.into())
    }

    /// Id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw thread id with any group prefix removed.
    pub fn raw(&self) -> &str {
        self.0.split_once('/').map_or(&self.0, |(_, raw)| raw)
    }
}

impl fmt::Display for LifelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Producer-supplied token pairing a send with its receive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap a correlation token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Token as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Horizontal slot of a live lifeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Lane(u32);

impl Lane {
    /// Create a lane from its index.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw index.
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Vertical model coordinate. Monotonic within a lifeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct YPos(u64);

impl YPos {
    /// Origin.
    pub const ZERO: Self = Self(0);

    /// Create a position.
    pub fn new(y: u64) -> Self {
        Self(y)
    }

    /// Raw value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Position `extent` further down.
    pub fn advanced(self, extent: u64) -> Self {
        Self(self.0.saturating_add(extent))
    }

    /// Value as a float for geometry.
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

macro_rules! arena_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            /// Create a handle from a raw arena position.
            pub fn new(index: usize) -> Self {
                Self(index)
            }

            /// Raw arena position.
            pub fn get(self) -> usize {
                self.0
            }
        }
    };
}

arena_handle!(
    /// Position of a lifeline in the model's lifeline arena.
    LifelineKey
);
arena_handle!(
    /// Position of an entity in its lifeline's history.
    EntityIndex
);
arena_handle!(
    /// Position of a stack frame in its lifeline's frame arena.
    FrameId
);
arena_handle!(
    /// Position of a communication in the model's communication arena.
    CommunicationId
);

/// Model-wide reference to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    /// Owning lifeline.
    pub lifeline: LifelineKey,
    /// Position in that lifeline's history.
    pub entity: EntityIndex,
}

/// Model-wide reference to a stack frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRef {
    /// Owning lifeline.
    pub lifeline: LifelineKey,
    /// Position in that lifeline's frame arena.
    pub frame: FrameId,
}

/// Something the user can select in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectedObject {
    /// A point-in-time entity (label, marker, title box).
    Entity(EntityRef),
    /// A call bar.
    Frame(FrameRef),
    /// A message line.
    Communication(CommunicationId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Rejected source group names.
pub enum InvalidSourceGroup {
    /// Empty tag.
    #[error("Source group cannot be empty")]
    Empty,
    /// Tag containing the qualification separator.
    #[error("Source group {0:?} cannot contain '/'")]
    Separator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_group_rejects_empty() {
        assert_eq!(SourceGroup::new(""), Err(InvalidSourceGroup::Empty));
    }

    #[test]
    fn source_group_rejects_separator() {
        assert!(matches!(
            SourceGroup::new("a/b"),
            Err(InvalidSourceGroup::Separator(_))
        ));
    }

    #[test]
    fn qualify_prefixes_group() {
        let group = SourceGroup::new("g1").unwrap();
        assert_eq!(group.qualify("t1").as_str(), "g1/t1");
    }

    #[test]
    fn unscoped_qualify_is_identity() {
        let group = SourceGroup::unscoped();
        assert!(group.is_unscoped());
        assert_eq!(group.qualify("g3/t1").as_str(), "g3/t1");
    }

    #[test]
    fn same_raw_id_in_two_groups_differs() {
        let a = SourceGroup::new("g1").unwrap().qualify("1234");
        let b = SourceGroup::new("g2").unwrap().qualify("1234");
        assert_ne!(a, b);
        assert_eq!(a.raw(), b.raw());
    }

    #[test]
    fn sequential_groups_round_trip_their_number() {
        let group = SourceGroup::sequential(7);
        assert_eq!(group.as_str(), "g7");
        assert_eq!(SourceGroup::sequence_number(group.as_str()), Some(7));
        assert_eq!(SourceGroup::sequence_number("gx"), None);
        assert_eq!(SourceGroup::sequence_number("7"), None);
    }

    #[test]
    fn ypos_advances_and_saturates() {
        assert_eq!(YPos::new(10).advanced(20), YPos::new(30));
        assert_eq!(YPos::new(u64::MAX).advanced(1), YPos::new(u64::MAX));
    }

    #[test]
    fn arena_handles_round_trip_raw_index() {
        assert_eq!(EntityIndex::new(7).get(), 7);
        assert!(FrameId::new(1) < FrameId::new(2));
    }
}
