pub mod boxes;
pub mod indicators;
pub mod sentiment;
pub mod technical;
