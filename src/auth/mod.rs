//! Passwordless auth: one-time email verification codes exchanged for
//! bearer tokens, with session claiming folded into the callback.

pub mod mailer;
pub mod routes;

pub use mailer::{LettreMailer, Mailer, NoopMailer};
