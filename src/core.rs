pub mod archive;
pub mod dir_cache;
pub mod discovery;
pub mod icon;
pub mod load_status;
pub mod manifest;
pub mod metadata_cache;
pub mod mod_reader;
pub mod registry;
pub mod remote_store;
pub mod source_collector;
