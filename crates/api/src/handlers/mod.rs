pub mod listings;
pub mod readings;
pub mod records;
pub mod segments;
