//! Storing the user's finance API token in a cookie and guarding routes that need it.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::{force_log_out, get_log_out};
pub use middleware::{auth_guard, auth_guard_hx};
pub use redirect::normalize_redirect_url;
pub use token::ApiToken;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
