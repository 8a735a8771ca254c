pub mod db;
pub mod postgres;
pub mod summarizer;
