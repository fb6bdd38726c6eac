//! Outbound mail transports used by the email probe

pub mod transport;

pub use transport::{FileTransport, MemoryOutbox};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
    pub headers: BTreeMap<String, String>,
}

impl EmailMessage {
    /// Renders the message as a plain-text RFC 5322 style document.
    pub fn render(&self) -> String {
        let mut rendered = String::new();
        rendered.push_str(&format!("Subject: {}\n", self.subject));
        rendered.push_str(&format!("From: {}\n", self.from));
        rendered.push_str(&format!("To: {}\n", self.to.join(", ")));
        for (name, value) in &self.headers {
            rendered.push_str(&format!("{}: {}\n", name, value));
        }
        rendered.push('\n');
        rendered.push_str(&self.body);
        rendered.push('\n');
        rendered
    }
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Hands the message to the transport and returns how many messages were accepted.
    async fn send(&self, message: &EmailMessage) -> Result<usize>;
}
