pub mod csv_table;
pub mod error;
pub mod lock;

pub use csv_table::{decode_rows, encode_rows, CsvTable, Snapshot, TableRow, TableStore};
pub use error::StoreError;
pub use lock::table_lock;
