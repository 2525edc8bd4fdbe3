mod container_config;
mod exec_options;
mod log_output;
mod log_output_stream;
mod logs_options;
mod path_stat;
mod pull_options;
mod query_options;
mod target;

pub use container_config::*;
pub use exec_options::*;
pub use log_output::*;
pub use log_output_stream::*;
pub use logs_options::*;
pub use path_stat::*;
pub use pull_options::*;
pub use query_options::*;
pub use target::*;
