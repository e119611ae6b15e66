//! RecordStore: the CSV-backed artist table
//!
//! One CSV per festival-year. The header row is the schema: its order is
//! preserved verbatim and new columns are only ever appended. Rows are
//! identified by the `Artist` column.

pub mod artist;
pub mod columns;
pub mod store;
pub mod table;
pub mod values;

pub use artist::ArtistRecord;
pub use store::{RecordStore, TableId};
pub use table::Table;
pub use values::{FrontPersonGender, FrontPersonOfColor};
