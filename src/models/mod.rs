pub mod message;
pub mod position;
pub mod trip;
