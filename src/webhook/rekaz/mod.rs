pub mod routes;
pub mod schemas;
pub mod security;
pub mod translator;
