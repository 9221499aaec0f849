pub mod block;
pub mod connector;
pub mod document;
pub mod graph;
pub mod math;
pub mod param_type;
pub mod port;
