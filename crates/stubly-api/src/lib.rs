pub mod auth;
pub mod banks;
pub mod error;
pub mod events;
pub mod mailer;
pub mod notifications;
pub mod otp;
pub mod time;
pub mod tokens;
pub mod uploads;
