pub mod recorder;
pub mod routes;
pub mod schemas;
pub mod security;
