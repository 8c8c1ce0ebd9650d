pub mod audit;
pub mod budget;
pub mod config;
pub mod errors;
pub mod judge;
pub mod logging;
pub mod models;
pub mod oracles;
pub mod pipeline;
pub mod shipyard_config;
pub mod util;
