use std::fmt::{self, Display};

use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

use super::ops::{Delete, Extent, Insert, Split};
use super::{Content, Len, Result};

/// Concurrency id: tells a transformation which of two operations at the
/// same position is displaced.
#[derive(Arbitrary, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cid {
    /// The operation being transformed is displaced.
    Own,

    /// The operation it is transformed against is displaced.
    Other,
}

/// Individual no-op, insert, delete or split operation.
#[derive(Arbitrary, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Represents an operation that does nothing.
    #[default]
    NoOp,

    /// Represents an insert-operation with a position and content.
    /// [Click here](Insert) to read more about insert operations.
    Insert(Insert),

    /// Represents a delete-operation with a position and extent.
    /// [Click here](Delete) to read more about delete operations.
    Delete(Delete),

    /// Represents two operations that are applied as one. [Click here](Split)
    /// to read more about split operations.
    Split(Split),
}

impl Operation {
    /// Applies this operation to the given content. The content is left
    /// untouched if this fails.
    pub fn apply(&self, content: &mut Content) -> Result<()> {
        match self {
            Operation::NoOp => Ok(()),
            Operation::Insert(insert) => content.splice(insert.position, 0, Some(&insert.content)),
            Operation::Delete(delete) => content.splice(delete.position, delete.len(), None),
            Operation::Split(split) => {
                let mut scratch = content.clone();

                split.first.apply(&mut scratch)?;
                split.second_after_first().apply(&mut scratch)?;

                *content = scratch;
                Ok(())
            }
        }
    }

    /// Returns the structural inverse of this operation.
    pub fn mirror(&self) -> Result<Operation> {
        Ok(match self {
            Operation::NoOp => Operation::NoOp,
            Operation::Insert(insert) => insert.mirror().into(),
            Operation::Delete(delete) => delete.mirror()?.into(),
            Operation::Split(split) => split.mirror()?.into(),
        })
    }

    /// Returns true if transforming this operation against another one at the
    /// same position needs a concurrency id to break the tie.
    pub fn requires_cid(&self) -> bool {
        match self {
            Operation::Insert(_) | Operation::Split(_) => true,
            Operation::NoOp | Operation::Delete(_) => false,
        }
    }

    /// Returns the concurrency id of this operation against `other` if it can
    /// be decided from positions alone. Only inserts can decide.
    pub fn concurrency_id(&self, other: &Operation) -> Option<Cid> {
        match self {
            Operation::Insert(insert) => insert.concurrency_id(other),
            Operation::NoOp | Operation::Delete(_) | Operation::Split(_) => None,
        }
    }
}

impl Len for Operation {
    fn len(&self) -> usize {
        match self {
            Self::NoOp => 0,
            Self::Insert(insert) => insert.len(),
            Self::Delete(delete) => delete.len(),
            Self::Split(split) => split.len(),
        }
    }
}

impl From<Insert> for Operation {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}

impl From<Delete> for Operation {
    fn from(value: Delete) -> Self {
        Self::Delete(value)
    }
}

impl From<Split> for Operation {
    fn from(value: Split) -> Self {
        Self::Split(value)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "NoOp()"),
            Self::Insert(insert) => write!(f, "Insert({}, {})", insert.position, insert.content),
            Self::Delete(Delete {
                position,
                extent: Extent::Content(content),
                ..
            }) => write!(f, "Delete({position}, {content})"),
            Self::Delete(Delete {
                position,
                extent: Extent::Count(count),
                ..
            }) => write!(f, "Delete({position}, {count})"),
            Self::Split(split) => write!(f, "Split({}, {})", split.first, split.second),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cid, Operation};
    use crate::ops::{Delete, Insert, Split};
    use crate::{Content, Error};

    #[test]
    fn test_apply() {
        let mut content = Content::from_text(1, "abc");

        Operation::from(Insert::new(1, Content::from_text(2, "X")))
            .apply(&mut content)
            .unwrap();
        assert_eq!(content.text(), "aXbc");

        Operation::from(Delete::irreversible(0, 2))
            .apply(&mut content)
            .unwrap();
        assert_eq!(content.text(), "bc");

        Operation::NoOp.apply(&mut content).unwrap();
        assert_eq!(content.text(), "bc");
    }

    #[test]
    fn test_apply_split_is_atomic() {
        let mut content = Content::from_text(1, "abc");
        let split = Split::new(Delete::irreversible(0, 1), Delete::irreversible(5, 1));

        assert!(Operation::from(split).apply(&mut content).is_err());
        assert_eq!(content.text(), "abc");
    }

    #[test]
    fn test_apply_split_keeps_insert_order() {
        let mut content = Content::from_text(1, "abef");
        let split = Split::new(
            Insert::new(2, Content::from_text(2, "c")),
            Insert::new(2, Content::from_text(2, "d")),
        );

        Operation::from(split).apply(&mut content).unwrap();
        assert_eq!(content.text(), "abcdef");
    }

    #[test]
    fn test_mirror_split() {
        let mut content = Content::from_text(1, "abcZdef");
        let split: Operation = Split::new(
            Delete::reversible(2, Content::from_text(1, "c")),
            Delete::reversible(4, Content::from_text(1, "de")),
        )
        .into();

        split.apply(&mut content).unwrap();
        assert_eq!(content.text(), "abZf");

        split.mirror().unwrap().apply(&mut content).unwrap();
        assert_eq!(content.text(), "abcZdef");
    }

    #[test]
    fn test_mirror_irreversible() {
        assert_eq!(
            Operation::from(Delete::irreversible(0, 1)).mirror(),
            Err(Error::Irreversible)
        );
        assert_eq!(Operation::NoOp.mirror(), Ok(Operation::NoOp));
    }

    #[test]
    fn test_requires_cid() {
        assert!(Operation::from(Insert::default()).requires_cid());
        assert!(!Operation::from(Delete::irreversible(0, 1)).requires_cid());
        assert!(!Operation::NoOp.requires_cid());
        assert_eq!(
            Operation::from(Delete::irreversible(0, 1))
                .concurrency_id(&Insert::new(3, Content::new()).into()),
            None
        );
        assert_eq!(
            Operation::from(Insert::new(4, Content::new()))
                .concurrency_id(&Insert::new(3, Content::new()).into()),
            Some(Cid::Own)
        );
    }

    #[test]
    fn test_display() {
        let op: Operation = Split::new(
            Insert::new(1, Content::from_text(1, "ab")),
            Delete::irreversible(4, 2),
        )
        .into();

        assert_eq!(op.to_string(), "Split(Insert(1, ab), Delete(4, 2))");
    }
}
