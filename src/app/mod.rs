pub mod feed;
pub mod identity;
pub mod likes;
pub mod posts;
pub mod replies;
pub mod store;
pub mod summary;
