use anyhow::Context;
use async_trait::async_trait;

use super::{Email, Mailer};

/// Delivers mail through a JSON email API (Resend-compatible).
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": [email.to],
                "subject": email.subject,
                "text": email.body,
            }))
            .send()
            .await
            .context("failed to reach email provider")?
            .error_for_status()
            .context("email provider returned error")?;

        Ok(())
    }
}
