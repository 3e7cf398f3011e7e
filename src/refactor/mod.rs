//! Text-preserving rewrites of build files.
//!
//! Fixes become byte-span edits on the original text. Everything outside
//! the edited spans (formatting, comments, unrelated code) is left as it was.

mod edit;
mod ordering;
mod pass;
mod sort;

pub use edit::{apply_edits, line_end, line_end_inclusive, line_ending, line_start, Edit};
pub use ordering::{DependencyOrdering, GroupKey, ItemKey, PluginOrdering};
pub use pass::{EditsApplied, FixOptions, FixPass, FixesSorted, Loaded, PlannedFix, Written};
pub use sort::{sort_edit, sorted_body};
