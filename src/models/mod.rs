pub mod courier;
pub mod presence;
pub mod sample;
