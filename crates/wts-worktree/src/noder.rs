use wts_types::ContentId;

use crate::error::WorktreeResult;

/// A node of a Merkle tree, as consumed by tree comparison.
///
/// Leaves are identified by [`hash`](Noder::hash); directories all carry the
/// same sentinel and are compared through their children.
pub trait Noder: Sized {
    /// Last path component; empty for the root.
    fn name(&self) -> &str;

    fn hash(&self) -> ContentId;

    fn is_dir(&self) -> bool;

    /// Children, sorted by name. Leaves have none.
    fn children(&self) -> WorktreeResult<&[Self]>;

    fn num_children(&self) -> WorktreeResult<usize> {
        Ok(self.children()?.len())
    }

    /// Whether comparison should pass over this node entirely.
    fn skip(&self) -> bool {
        false
    }
}
