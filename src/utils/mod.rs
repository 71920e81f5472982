pub mod encryption;
pub mod errors;
pub mod page;
pub mod table;
pub mod time;

pub use errors::{extract_detail_message, short_id};
pub use page::Page;
pub use table::Table;
