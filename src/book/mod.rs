pub mod polyglot_book;
pub mod polyglot_entry;
pub mod polyglot_hash;
pub mod polyglot_keys;

pub use polyglot_book::{BookError, PolyglotBook};
pub use polyglot_entry::PolyglotEntry;
pub use polyglot_hash::compute_polyglot_hash;
