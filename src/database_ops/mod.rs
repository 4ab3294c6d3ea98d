pub mod db;
pub mod mappers;
pub mod models;
pub mod repository;

pub use db::Db;
