//! CLI command implementations.
//!
//! | Module   | Commands handled   |
//! |----------|--------------------|
//! | `run`    | `Run`              |
//! | `status` | `Runs`, `Status`   |
//! | `config` | `Config`           |

pub mod config;
pub mod run;
pub mod status;

pub use config::cmd_config;
pub use run::run_pipeline;
pub use status::{cmd_runs, cmd_status};
