pub mod like;
pub mod post;
pub mod reply;
pub mod user;
