pub mod cli;
pub mod http;

pub use cli::{init_config, Cli, CliError, CliHandler, Commands};
pub use http::{build_router, parse_flag, parse_number, AddrsPayload, ApiError, ApiServer, AppState, ErrorResponse};
