pub mod auth;
pub mod error;
pub mod friends;
pub mod hobbies;
pub mod messages;
pub mod middleware;
pub mod profile;
pub mod recommend;
pub mod users;

mod convert;
