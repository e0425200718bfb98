pub mod car;
pub mod classification;
pub mod reading;
pub mod record;
pub mod segment;
pub mod sensor;
