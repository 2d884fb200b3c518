pub mod capture;
pub mod config;
pub mod device;
pub mod ingest;
pub mod pose;
pub mod protocol;
pub mod render;
pub mod sender;
