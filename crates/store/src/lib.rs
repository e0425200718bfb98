mod cars;
mod classifications;
mod db;
mod readings;
mod records;
mod schema;
mod segments;
mod sensors;

pub use db::{Store, StoreStatus};
