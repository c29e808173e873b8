pub mod gateway;
pub mod normalizer;
