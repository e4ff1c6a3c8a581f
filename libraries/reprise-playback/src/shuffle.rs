//! Random pick for shuffle mode

use rand::seq::SliceRandom;
use rand::Rng;
use reprise_core::FileId;

/// Pick a file uniformly at random, excluding `current` when there is any
/// other choice.
///
/// A single-file list always yields that file; an empty list yields `None`.
pub fn pick_other<R: Rng + ?Sized>(
    files: &[FileId],
    current: Option<&FileId>,
    rng: &mut R,
) -> Option<FileId> {
    if files.len() <= 1 {
        return files.first().cloned();
    }

    let candidates: Vec<&FileId> = files.iter().filter(|f| Some(*f) != current).collect();
    if candidates.is_empty() {
        // Every entry is the current file
        return files.first().cloned();
    }
    candidates.choose(rng).map(|f| (*f).clone())
}
