pub mod client;
pub mod config;
pub mod db;
pub mod debounce;
pub mod edit_log;
pub mod errors;
pub mod explorer;
pub mod export;
pub mod introspect;
pub mod models;
pub mod session;
pub mod sql;

pub use config::Config;
pub use edit_log::EditLog;
pub use errors::DbError;
pub use explorer::Explorer;
pub use session::Session;
