pub mod offline_db;

pub use offline_db::{is_latin_script, ManamiOfflineDatabase};
