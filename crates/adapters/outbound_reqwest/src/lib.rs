//! # relay-adapter-outbound-reqwest
//!
//! Outbound transport adapters: HTTP through [reqwest] and a mail
//! transport that logs instead of sending. The mail adapter is a
//! stand-in for an SMTP integration; swapping it out only requires
//! another `Mailer` implementation.

mod http_client;
mod mailer;

pub use http_client::ReqwestHttpClient;
pub use mailer::TracingMailer;
