pub mod backend;
pub mod email;
pub mod noop;
pub mod twilio;

pub use backend::{EmailSender, MessageSender, SentMessage};
pub use email::EmailWebhook;
pub use noop::NoopEmailSender;
pub use twilio::TwilioSender;
