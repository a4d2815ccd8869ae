mod holding;
mod portfolio;
mod user;

pub use holding::Holding;
pub use portfolio::Portfolio;
pub use user::User;
