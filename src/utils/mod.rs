pub mod address;
pub mod currency;
pub mod move_decode;
