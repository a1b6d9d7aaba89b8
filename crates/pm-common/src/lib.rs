pub mod api;
pub mod db;
pub mod explain;
pub mod logging;
pub mod matching;
pub mod run_id;
pub mod warehouse;
