// Domain layer: records and the ports the scraper talks through.

pub mod model;
pub mod ports;
