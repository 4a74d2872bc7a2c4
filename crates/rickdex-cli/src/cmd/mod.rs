pub mod auth;
pub mod completions;
pub mod fav;
pub mod list;
pub mod options;
pub mod show;
