use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

use super::{Content, Len, Result};

/// Piece of text that a transformation removed from a delete, together with
/// the offset at which it has to be restored.
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReconSegment {
    /// Offset relative to the start of the delete.
    pub offset: usize,

    /// Text that was transformed away.
    pub content: Content,
}

/// Ledger of the text that has been "transformed away" from a non-reversible
/// [`Delete`](crate::ops::Delete).
///
/// A non-reversible delete only knows how many characters it removes. When it
/// is transformed against a concurrent delete that already removed part of
/// its range, that part is recorded here so the full removed text can be
/// reconstructed later and the delete can be made reversible.
#[derive(Arbitrary, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recon {
    segments: Vec<ReconSegment>,
}

impl Recon {
    /// Returns a new empty ledger.
    pub fn new() -> Recon {
        Recon::default()
    }

    /// Returns the fragments of this ledger in the order they were recorded.
    pub fn segments(&self) -> &[ReconSegment] {
        &self.segments
    }

    /// Returns true if this ledger doesn't contain any fragments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new ledger with one more fragment. Empty content isn't
    /// recorded.
    pub fn update(&self, offset: usize, content: &Content) -> Recon {
        let mut recon = self.clone();

        if !content.is_empty() {
            recon.segments.push(ReconSegment {
                offset,
                content: content.clone(),
            });
        }

        recon
    }

    /// Inserts every fragment into the given snapshot, newest first. Each
    /// fragment's offset refers to the delete as it was after all older
    /// fragments had been removed from it.
    pub fn restore(&self, content: &mut Content) -> Result<()> {
        self.segments
            .iter()
            .rev()
            .try_for_each(|segment| content.splice(segment.offset, 0, Some(&segment.content)))
    }

    /// Divides this ledger at the given offset. Fragments before `at` stay
    /// with the first half and the others are rebased onto the second half.
    pub fn split(&self, at: usize) -> (Recon, Recon) {
        let (first, second): (Vec<_>, Vec<_>) = self
            .segments
            .iter()
            .cloned()
            .partition(|segment| segment.offset < at);

        let second = second
            .into_iter()
            .map(|segment| ReconSegment {
                offset: segment.offset - at,
                content: segment.content,
            })
            .collect();

        (Recon { segments: first }, Recon { segments: second })
    }
}
