//! Types that represent the insert, delete and split operations within Tandem.

use std::cmp::Ordering;

use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

use super::{Cid, Content, Error, Len, Operation, Recon, Result, Transform};

/// Represents an operation that inserts content at a position.
///
/// For more information about the transformations of this operation, read
/// the documentation on the following trait implementations:
///
/// | Alice  | Bob    | Transformation |
/// |:-------|:-------|:---------------|
/// | Insert | Insert | [`Transform<&Insert>`][1] |
/// | Insert | Delete | [`Transform<&Delete>`][2] |
/// | Insert | Split  | [`Transform<&Split>`][3]  |
///
/// [1]: #impl-Transform<%26Insert>-for-%26Insert
/// [2]: #impl-Transform<%26Delete>-for-%26Insert
/// [3]: #impl-Transform<%26Split>-for-%26Insert
#[derive(Arbitrary, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Insert {
    /// Character offset at which the content is inserted.
    pub position: usize,

    /// Contains the content that this operation inserts.
    pub content: Content,
}

impl Insert {
    /// Returns a new insert operation.
    pub fn new(position: usize, content: Content) -> Insert {
        Insert { position, content }
    }

    /// Returns the reversible delete that removes exactly what this insert
    /// inserts.
    pub fn mirror(&self) -> Delete {
        Delete::reversible(self.position, self.content.clone())
    }

    /// Decides which of two operations is displaced if both were to touch the
    /// same position, based on position alone. The operation at the higher
    /// position is displaced. Returns `None` if both positions are equal (or
    /// `other` doesn't have a position), in which case the decision has to
    /// be made by the caller.
    pub fn concurrency_id(&self, other: &Operation) -> Option<Cid> {
        let position = match other {
            Operation::Insert(insert) => insert.position,
            Operation::Delete(delete) => delete.position,
            Operation::NoOp | Operation::Split(_) => return None,
        };

        match self.position.cmp(&position) {
            Ordering::Less => Some(Cid::Other),
            Ordering::Greater => Some(Cid::Own),
            Ordering::Equal => None,
        }
    }
}

impl Len for Insert {
    fn len(&self) -> usize {
        self.content.len()
    }
}

/// Describes what a [`Delete`] removes.
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extent {
    /// The removed content is known, so the delete can be mirrored.
    Content(Content),

    /// Only the number of removed characters is known.
    Count(usize),
}

impl Len for Extent {
    fn len(&self) -> usize {
        match self {
            Extent::Content(content) => content.len(),
            Extent::Count(count) => *count,
        }
    }
}

/// Represents an operation that removes a range of characters.
///
/// Deletes constructed from the removed content are reversible: they can be
/// mirrored into an insert. Deletes that only know the number of characters
/// they remove are not, until they are upgraded with
/// [`Delete::make_reversible`]. While a non-reversible delete is transformed,
/// the text that concurrent deletes already removed from its range is kept in
/// its [`Recon`] ledger.
///
/// | Alice  | Bob    | Transformation |
/// |:-------|:-------|:---------------|
/// | Delete | Insert | [`Transform<&Insert>`][1] |
/// | Delete | Delete | [`Transform<&Delete>`][2] |
/// | Delete | Split  | [`Transform<&Split>`][3]  |
///
/// [1]: #impl-Transform<%26Insert>-for-%26Delete
/// [2]: #impl-Transform<%26Delete>-for-%26Delete
/// [3]: #impl-Transform<%26Split>-for-%26Delete
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delete {
    /// Offset of the first removed character.
    pub position: usize,

    /// Removed content or number of removed characters.
    pub extent: Extent,

    /// Text that transformations removed from this delete's range.
    #[serde(default, skip_serializing_if = "Recon::is_empty")]
    pub recon: Recon,
}

impl Delete {
    /// Returns a reversible delete that removes the given content.
    pub fn reversible(position: usize, content: Content) -> Delete {
        Delete {
            position,
            extent: Extent::Content(content),
            recon: Recon::new(),
        }
    }

    /// Returns a non-reversible delete that removes `count` characters.
    pub fn irreversible(position: usize, count: usize) -> Delete {
        Delete {
            position,
            extent: Extent::Count(count),
            recon: Recon::new(),
        }
    }

    /// Returns true if this delete knows the content it removes.
    pub fn is_reversible(&self) -> bool {
        matches!(self.extent, Extent::Content(_))
    }

    /// Returns the removed content if this delete is reversible.
    pub fn removed(&self) -> Option<&Content> {
        match &self.extent {
            Extent::Content(content) => Some(content),
            Extent::Count(_) => None,
        }
    }

    /// Splits this delete into two adjoining deletes at the given offset. The
    /// second delete starts where the first one ends, i.e. both positions
    /// refer to the same content. Recon fragments are divided by offset.
    pub fn split(&self, at: usize) -> (Delete, Delete) {
        match &self.extent {
            Extent::Content(content) => (
                Delete::reversible(self.position, content.extract(0, at)),
                Delete::reversible(self.position + at, content.extract(at, content.len())),
            ),
            Extent::Count(count) => {
                let (first, second) = self.recon.split(at);

                (
                    Delete {
                        position: self.position,
                        extent: Extent::Count(at),
                        recon: first,
                    },
                    Delete {
                        position: self.position + at,
                        extent: Extent::Count(count.saturating_sub(at)),
                        recon: second,
                    },
                )
            }
        }
    }

    /// Merges this delete with the one that follows it. The result removes
    /// the same range as both deletes executed sequentially. Fails if only
    /// one of both is reversible.
    pub fn merge(&self, other: &Delete) -> Result<Delete> {
        match self.is_reversible() == other.is_reversible() {
            true => Ok(self.concat(other)),
            false => Err(Error::IrreversibleMerge),
        }
    }

    pub(crate) fn concat(&self, other: &Delete) -> Delete {
        let extent = match (&self.extent, &other.extent) {
            (Extent::Content(lhs), Extent::Content(rhs)) => {
                let segments = lhs.segments().iter().chain(rhs.segments()).cloned();
                Extent::Content(Content::from_segments(segments))
            }
            (lhs, rhs) => Extent::Count(lhs.len() + rhs.len()),
        };

        Delete {
            position: self.position,
            extent,
            recon: Recon::new(),
        }
    }

    /// Returns the insert that restores what this delete removes. Fails if
    /// this delete isn't reversible.
    pub fn mirror(&self) -> Result<Insert> {
        self.removed()
            .map(|content| Insert::new(self.position, content.clone()))
            .ok_or(Error::Irreversible)
    }

    /// Returns a reversible version of this delete, given a transformed
    /// version of it that could be applied to `content`. Reversible deletes
    /// are returned as is.
    pub fn make_reversible(&self, transformed: &Operation, content: &Content) -> Result<Delete> {
        match &self.extent {
            Extent::Content(removed) => Ok(Delete::reversible(self.position, removed.clone())),
            Extent::Count(_) => Ok(Delete::reversible(
                self.position,
                Delete::affected_content(transformed, content)?,
            )),
        }
    }

    /// Returns the content that the given delete (or split of deletes)
    /// removes from `content`, including the text recorded in recon ledgers.
    pub fn affected_content(operation: &Operation, content: &Content) -> Result<Content> {
        match operation {
            Operation::Split(split) => {
                let first = Delete::affected_content(&split.first, content)?;
                let mut second = Delete::affected_content(&split.second, content)?;

                second.splice(0, 0, Some(&first))?;
                Ok(second)
            }
            Operation::Delete(delete) => {
                let mut affected = content.slice(delete.position..delete.position + delete.len())?;
                delete.recon.restore(&mut affected)?;
                Ok(affected)
            }
            Operation::NoOp | Operation::Insert(_) => Ok(Content::new()),
        }
    }
}

impl Len for Delete {
    fn len(&self) -> usize {
        self.extent.len()
    }
}

/// Represents two operations that are applied as one. Splits are produced
/// only by transformation, e.g. when a delete is transformed against an
/// insert that lands inside its range.
///
/// Both components refer to the same content: to apply a split, the first
/// component is applied and then the second component transformed against
/// the first.
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Split {
    /// Operation applied first.
    pub first: Box<Operation>,

    /// Operation applied after it has been transformed against `first`.
    pub second: Box<Operation>,
}

impl Split {
    /// Returns a new split of both operations.
    pub fn new(first: impl Into<Operation>, second: impl Into<Operation>) -> Split {
        Split {
            first: Box::new(first.into()),
            second: Box::new(second.into()),
        }
    }

    /// Returns the second component transformed against the first. On a tie
    /// the second component is displaced so both keep their order.
    pub fn second_after_first(&self) -> Operation {
        (&*self.second).transform(&*self.first, Some(Cid::Own))
    }

    /// Returns the split that reverts this split.
    pub fn mirror(&self) -> Result<Split> {
        Ok(Split::new(
            self.first.mirror()?,
            self.second_after_first().mirror()?,
        ))
    }
}

impl Len for Split {
    fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }
}
