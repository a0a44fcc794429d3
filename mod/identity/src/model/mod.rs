mod account;
mod entity;
mod guest;
mod oauth;
mod token;

pub use account::*;
pub use entity::*;
pub use guest::*;
pub use oauth::*;
pub use token::*;
