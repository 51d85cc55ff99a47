pub mod indicators;
pub mod patterns;
pub mod sentiment;
