use crate::domain_port::{Mail, Mailer};
use crate::logger::*;

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        LogMailer { from: from.into() }
    }
}

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        info!(from = %self.from, to = %mail.to, subject = %mail.subject, "{}", mail.body);
        Ok(())
    }
}
