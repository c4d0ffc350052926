pub mod file;
pub mod id;
pub mod json_doc;
pub mod thread;
pub mod toml;
pub mod version;
