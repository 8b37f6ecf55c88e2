//! SQLite warehouse access shared by the release tooling

pub mod init;
pub mod tables;

pub use init::init_warehouse;
pub use tables::{list_tables, read_table, table_exists, write_table};
