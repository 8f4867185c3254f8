pub mod entry;
pub mod feed;

pub use entry::{Entry, EntryKey};
pub use feed::Feed;
