pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{
    get_mirror_path, host_with_port, normalize_start_url, origin_of, strip_query,
};
