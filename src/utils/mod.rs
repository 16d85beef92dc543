pub mod config;
pub mod crumbstat_toml;
pub mod logger;

pub use config::*;
pub use crumbstat_toml::{
    CrumbstatToml, apply_file_to_opts, load_config_file, load_crumbstat_toml,
    parse_crumbstat_toml,
};
pub use logger::setup_logging;
