pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod install;
pub mod pipeline;
pub mod postprocess;
pub mod probe;
pub mod report;
pub mod rtf;
pub mod util;
