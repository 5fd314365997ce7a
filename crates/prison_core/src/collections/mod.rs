//! # Arena-Backed Containers
//!
//! Growable containers whose storage lives in an [`Arena`](crate::memory::Arena):
//!
//! - [`HandleList`]: a list of `i32` handles (entity ids, asset indices)
//! - [`StrTable`]: a string-keyed table of `i32` values

mod handle_list;
mod hash;
mod str_table;

pub use handle_list::{HandleIter, HandleList};
pub use hash::fnv1a;
pub use str_table::{StrTable, StrTableIter};
