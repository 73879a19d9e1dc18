pub mod config;
pub mod error;
pub mod phone;
pub mod text;
pub mod types;

pub use config::Config;
pub use error::RoadWatchError;
pub use phone::{chat_address, normalize_user_id};
pub use text::{localized, TextKey};
pub use types::*;
