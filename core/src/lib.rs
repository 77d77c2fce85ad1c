pub mod check;
pub mod executor;
pub mod network;
pub mod pipeline;
