pub mod error;
pub mod feed;
pub mod pagination;
pub mod posts;
pub mod profile;
pub mod repos;
