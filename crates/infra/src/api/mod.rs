//! Concrete implementation of the Mailgun API port.

pub mod client;

pub use client::MailgunClient;
