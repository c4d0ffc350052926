pub mod cache_dto;
pub mod descriptor;
pub mod error;
pub mod paths;
pub mod source;
