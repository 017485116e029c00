pub mod archive;
pub mod command;
pub mod error;
pub mod exit_code;
pub mod log_filter;
pub mod parser;
pub mod render;
pub mod transpose;

pub use crate::archive::{DEFAULT_DOCKERFILE_NAME, transpose_tar, transpose_tar_stream};
pub use crate::command::{Args, Command};
pub use crate::error::Error;
pub use crate::exit_code::ExitCode;
pub use crate::log_filter::BuildLogFilter;
pub use crate::parser::parse_commands;
pub use crate::render::render;
pub use crate::transpose::{TransposeOptions, transpose};
