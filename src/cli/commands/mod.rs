mod fetch;
mod user;

pub use fetch::cmd_fetch_page;
pub use user::cmd_user_add;
