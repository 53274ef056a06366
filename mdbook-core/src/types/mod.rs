//! Core types shared by books, references and export

mod block;
mod frontmatter;
mod status;

pub use block::{
    inlines_to_text, visit_inlines, visit_inlines_mut, Block, Inline, TableCell, TableData,
};
pub use frontmatter::{cleanup_content, join_frontmatter, split_frontmatter, Frontmatter, ItemOrder};
pub use status::Status;
