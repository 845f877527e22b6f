pub mod coordinates;
pub mod framing;
pub mod tk103;

pub use tk103::decode;
