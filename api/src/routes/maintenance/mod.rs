pub mod cleanup_route;
pub mod stats_route;
