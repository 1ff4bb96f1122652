// Domain layer: store model and ports. No I/O here.

pub mod model;
pub mod ports;
