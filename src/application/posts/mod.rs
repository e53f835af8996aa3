mod reader;
pub mod types;
mod writer;

pub use reader::PostReadService;
pub use types::{
    AdminPostsQuery, CreatePostCommand, ListPostsQuery, PostWriteError, UpdatePostCommand,
    ensure_non_empty,
};
pub use writer::PostWriteService;
