pub mod cache;
pub mod controller;
pub mod filter;
pub mod sequence;
