use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::config::NotifierSettings;
use crate::error::{ConfigError, DashboardResult};

pub const INACCESSIBLE_TITLE: &str = "Server Inaccessible";

const GOTIFY_KEY_HEADER: &str = "X-Gotify-Key";

/// A notification to push for one failed probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEvent {
    pub title: String,
    pub message: String,
}

impl AlertEvent {
    pub fn inaccessible(domain: &str, region: &str) -> Self {
        Self {
            title: INACCESSIBLE_TITLE.to_string(),
            message: format!("Server {domain} is not accessible from {region}"),
        }
    }
}

#[derive(Debug, Serialize)]
struct GotifyMessage<'a> {
    title: &'a str,
    message: &'a str,
    priority: u8,
}

/// Pushes messages to a Gotify server
///
/// Delivery is best effort: failures are logged and never returned.
#[derive(Debug, Clone)]
pub struct AlertNotifier {
    client: Client,
    url: String,
    token: String,
    priority: u8,
}

impl AlertNotifier {
    pub fn new(settings: &NotifierSettings) -> DashboardResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                ConfigError::invalid("gotify", format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            url: format!("{}/message", settings.url.trim_end_matches('/')),
            token: settings.token.clone(),
            priority: settings.priority,
        })
    }

    pub async fn notify_event(&self, event: &AlertEvent) {
        self.notify(&event.title, &event.message).await;
    }

    #[instrument(skip(self))]
    pub async fn notify(&self, title: &str, message: &str) {
        let payload = GotifyMessage {
            title,
            message,
            priority: self.priority,
        };

        let request = self
            .client
            .post(&self.url)
            .header(GOTIFY_KEY_HEADER, &self.token)
            .json(&payload);

        match request.send().await {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Successfully sent Gotify alert");
                } else {
                    error!("Gotify alert failed with status: {}", response.status());
                }
            }
            Err(e) => {
                error!("Failed to send Gotify alert: {}", e);
            }
        }
    }
}
