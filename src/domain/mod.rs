// Domain layer: product documents, marketplace payloads and the ports the core depends on.

pub mod model;
pub mod ports;
