//! I/O helpers for controller invocations.

pub mod commit;
pub mod config;
pub mod gateway;
pub mod init;
pub mod lock;
pub mod paths;
pub mod process;
pub mod run_log;
pub mod state;
