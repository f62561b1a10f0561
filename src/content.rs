use std::fmt::{self, Display};
use std::ops::{Bound, RangeBounds};

use arbitrary::{Arbitrary, Unstructured};
use serde::{Deserialize, Serialize};

use super::seq::byte_offset;
use super::{Error, Len, Result, UserId};

/// Run of text written by a single user.
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// User that wrote this text.
    pub user: UserId,

    /// Contains the text of this run.
    pub text: String,
}

impl Segment {
    /// Returns a new segment with the given author and text.
    pub fn new(user: UserId, text: impl Into<String>) -> Segment {
        Segment {
            user,
            text: text.into(),
        }
    }
}

impl Len for Segment {
    fn len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Ordered text partitioned into user-attributed [`Segment`]s.
///
/// Content is always kept in compacted form: no segment is empty and no two
/// adjacent segments share the same user. All offsets are character offsets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct Content {
    segments: Vec<Segment>,
}

impl Content {
    /// Returns new empty content.
    pub fn new() -> Content {
        Content::default()
    }

    /// Returns content that consists of a single run of text by the given
    /// user.
    pub fn from_text(user: UserId, text: impl Into<String>) -> Content {
        Content::from_segments([Segment::new(user, text)])
    }

    /// Returns content that consists of the given segments, compacted.
    pub fn from_segments<I>(segments: I) -> Content
    where
        I: IntoIterator<Item = Segment>,
    {
        let mut content = Content {
            segments: segments.into_iter().collect(),
        };

        content.compact();
        content
    }

    /// Returns the segments of this content.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the concatenated text of all segments.
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Returns a deep copy of the given character range as new content.
    /// Fails if the range doesn't lie within this content.
    pub fn slice<R>(&self, range: R) -> Result<Content>
    where
        R: RangeBounds<usize>,
    {
        let len = self.len();

        let begin = match range.start_bound() {
            Bound::Included(&begin) => begin,
            Bound::Excluded(&begin) => begin + 1,
            Bound::Unbounded => 0,
        };

        let end = match range.end_bound() {
            Bound::Included(&end) => end + 1,
            Bound::Excluded(&end) => end,
            Bound::Unbounded => len,
        };

        if begin > end || end > len {
            return Err(Error::OutOfRange { index: end, len });
        }

        Ok(self.extract(begin, end))
    }

    /// Removes `remove` characters starting at `index` and inserts a copy of
    /// `insert` at that position. Fails without mutating anything if the
    /// removed range doesn't lie within this content.
    pub fn splice(&mut self, index: usize, remove: usize, insert: Option<&Content>) -> Result<()> {
        let len = self.len();

        if index > len {
            return Err(Error::OutOfRange { index, len });
        }

        if index + remove > len {
            return Err(Error::OutOfRange {
                index: index + remove,
                len,
            });
        }

        let mut segments = self.extract(0, index).segments;

        if let Some(insert) = insert {
            segments.extend(insert.segments.iter().cloned());
        }

        segments.extend(self.extract(index + remove, len).segments);

        *self = Content::from_segments(segments);

        Ok(())
    }

    /// Copies the characters in `begin..end`, clamping the range to this
    /// content.
    pub(crate) fn extract(&self, begin: usize, end: usize) -> Content {
        let mut segments = Vec::new();
        let mut offset = 0;

        for segment in &self.segments {
            if offset >= end {
                break;
            }

            let len = segment.len();
            let from = begin.max(offset);
            let to = end.min(offset + len);

            if from < to {
                let start = byte_offset(&segment.text, from - offset);
                let stop = byte_offset(&segment.text, to - offset);

                segments.push(Segment::new(segment.user, &segment.text[start..stop]));
            }

            offset += len;
        }

        Content::from_segments(segments)
    }

    /// Drops empty segments and merges adjacent segments by the same user.
    fn compact(&mut self) {
        let mut compacted: Vec<Segment> = Vec::with_capacity(self.segments.len());

        for segment in self.segments.drain(..) {
            if segment.text.is_empty() {
                continue;
            }

            match compacted.last_mut() {
                Some(last) if last.user == segment.user => last.text.push_str(&segment.text),
                Some(_) | None => compacted.push(segment),
            }
        }

        self.segments = compacted;
    }
}

impl Len for Content {
    fn len(&self) -> usize {
        self.segments.iter().map(Len::len).sum()
    }
}

impl Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.segments
            .iter()
            .try_for_each(|segment| f.write_str(&segment.text))
    }
}

impl From<Vec<Segment>> for Content {
    fn from(value: Vec<Segment>) -> Self {
        Content::from_segments(value)
    }
}

impl From<Content> for Vec<Segment> {
    fn from(value: Content) -> Self {
        value.segments
    }
}

impl<'a> Arbitrary<'a> for Content {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Content::from_segments(Vec::<Segment>::arbitrary(u)?))
    }
}
