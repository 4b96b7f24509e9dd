//! Google Calendar backend for nlcal: OAuth bootstrap and event insertion.

pub mod auth;
mod calendar;
mod credentials;
mod session;

pub use calendar::GoogleCalendar;
pub use credentials::ClientSecrets;
pub use session::Tokens;
