// Domain layer: records, the filter and stage vocabulary, and the ports the core depends on.

pub mod document;
pub mod filter;
pub mod model;
pub mod ports;
pub mod stage;
