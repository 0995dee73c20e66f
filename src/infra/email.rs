//! Email notification over an HTTP sending API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::application::contact::{ContactSubmission, Notifier, NotifyError};

const SOURCE: &str = "infra::email";
const DEFAULT_ENDPOINT: &str = "https://api.resend.com/emails";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct EmailNotifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
    recipient: String,
}

impl EmailNotifier {
    pub fn new(
        endpoint: Option<String>,
        api_key: String,
        from: String,
        recipient: String,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
            from,
            recipient,
        })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, submission: &ContactSubmission) -> Result<(), NotifyError> {
        let body = json!({
            "from": self.from,
            "to": [self.recipient],
            "reply_to": submission.email,
            "subject": format!("Contact form: {}", submission.subject),
            "text": format!(
                "From: {} <{}>\n\n{}",
                submission.name, submission.email, submission.message
            ),
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| NotifyError(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(target = SOURCE, "notification email dispatched");
            Ok(())
        } else {
            Err(NotifyError(format!("email API returned {status}")))
        }
    }
}
