pub mod manager;
pub mod memory;
pub mod pg;
pub mod store;

pub use manager::{is_valid_identifier, quote_identifier, DatabaseError, DatabaseManager};
pub use memory::{MemoryEntityStore, MemoryUserStore};
pub use pg::{PgEntityStore, PgUserStore};
pub use store::{
    label_text, row_id, AdminUser, EntityStore, PageQuery, RelatedRow, Row, SortColumn,
    SortDirection, SortKey, StoreOptions, UserStore,
};
