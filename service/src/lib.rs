//! Process-wide infrastructure shared by every crate in the workspace:
//! command line / environment configuration and console logging.

pub mod config;
pub mod logging;
