/// Implemented by types that have a length in characters (including
/// [`Content`](super::Content) and all of the
/// [`Operation`](super::Operation)s).
pub trait Len {
    /// Should return the exact length of the receiver in characters.
    fn len(&self) -> usize;

    /// Returns true if the receiver has a length of zero.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns the byte offset of the character at the given index, or the byte
/// length of `text` if the index lies at or beyond its end.
pub(crate) fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
