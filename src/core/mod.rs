pub mod accessor;
pub mod builder;
pub mod chain;
pub mod checksum;
pub mod config;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod header;
pub mod manifest;
pub mod type_id;
