pub mod browse;
pub mod query;
pub mod schema;
