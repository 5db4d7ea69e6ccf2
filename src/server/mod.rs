pub mod config;
pub mod db_ready;
