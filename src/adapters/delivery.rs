use crate::domain::model::{DeliverySettings, Email};
use crate::domain::ports::EmailService;
use crate::utils::error::{MergeError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};

pub const LOG_SERVICE: &str = "log";
pub const WEBHOOK_SERVICE: &str = "webhook";

/// Writes each message to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogDelivery;

#[async_trait]
impl EmailService for LogDelivery {
    fn name(&self) -> &str {
        LOG_SERVICE
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn send_emails(&self, emails: &[Email]) -> Result<HashMap<String, String>> {
        let mut statuses = HashMap::with_capacity(emails.len());
        for email in emails {
            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                bytes = email.body.len(),
                "✉️ {}",
                email.body
            );
            statuses.insert(email.to.clone(), "logged".to_string());
        }
        Ok(statuses)
    }
}

/// POSTs the rendered batch as a JSON array to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    endpoint: String,
    health_endpoint: Option<String>,
    headers: HashMap<String, String>,
    timeout: Option<std::time::Duration>,
    client: Client,
}

impl WebhookDelivery {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            health_endpoint: None,
            headers: HashMap::new(),
            timeout: None,
            client: Client::new(),
        }
    }

    pub fn from_settings(settings: &DeliverySettings) -> Result<Self> {
        let endpoint = settings
            .endpoint
            .clone()
            .ok_or_else(|| MergeError::MissingConfigError {
                field: "delivery.endpoint".to_string(),
            })?;

        let mut delivery = Self::new(endpoint);
        delivery.health_endpoint = settings.health_endpoint.clone();
        delivery.headers = settings.headers.clone().unwrap_or_default();
        delivery.timeout = settings.timeout_seconds.map(std::time::Duration::from_secs);
        Ok(delivery)
    }
}

#[async_trait]
impl EmailService for WebhookDelivery {
    fn name(&self) -> &str {
        WEBHOOK_SERVICE
    }

    async fn is_available(&self) -> bool {
        let Some(health) = &self.health_endpoint else {
            return validate_url("delivery.endpoint", &self.endpoint).is_ok();
        };

        let mut request = self.client.get(health);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        match request.send().await {
            Ok(response) => {
                tracing::debug!("📡 Health check {} returned {}", health, response.status());
                response.status().is_success()
            }
            Err(e) => {
                tracing::warn!("📡 Health check {} failed: {}", health, e);
                false
            }
        }
    }

    async fn send_emails(&self, emails: &[Email]) -> Result<HashMap<String, String>> {
        let mut request = self.client.post(&self.endpoint).json(emails);

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!("📡 Posting {} emails to {}", emails.len(), self.endpoint);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 Webhook response status: {}", status);

        if !status.is_success() {
            return Err(MergeError::DeliveryError {
                service: WEBHOOK_SERVICE.to_string(),
                message: format!("endpoint responded with status {}", status),
            });
        }

        let body = response.text().await?;
        match serde_json::from_str::<HashMap<String, String>>(&body) {
            Ok(statuses) => Ok(statuses),
            Err(_) => Ok(emails
                .iter()
                .map(|email| (email.to.clone(), format!("accepted ({})", status.as_u16())))
                .collect()),
        }
    }
}

/// Delivery services addressable by name.
#[derive(Default)]
pub struct EmailServiceRegistry {
    services: BTreeMap<String, Box<dyn EmailService>>,
}

impl EmailServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `log` is always registered. `webhook` is registered when an endpoint is
    /// configured or selected, so selecting it without an endpoint fails on
    /// the missing field.
    pub fn from_settings(settings: &DeliverySettings) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(LogDelivery));
        if settings.endpoint.is_some() || settings.service == WEBHOOK_SERVICE {
            registry.register(Box::new(WebhookDelivery::from_settings(settings)?));
        }
        Ok(registry)
    }

    pub fn register(&mut self, service: Box<dyn EmailService>) {
        self.services.insert(service.name().to_string(), service);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Result<&dyn EmailService> {
        self.services
            .get(name)
            .map(|service| service.as_ref())
            .ok_or_else(|| self.unknown(name))
    }

    /// Removes and returns the named service, for handing to the engine.
    pub fn take(&mut self, name: &str) -> Result<Box<dyn EmailService>> {
        match self.services.remove(name) {
            Some(service) => Ok(service),
            None => Err(self.unknown(name)),
        }
    }

    fn unknown(&self, name: &str) -> MergeError {
        MergeError::UnknownDeliveryService {
            name: name.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        }
    }
}

/// The service named in `settings`, or `None` when delivery is not configured.
pub fn configured_service(
    settings: Option<DeliverySettings>,
) -> Result<Option<Box<dyn EmailService>>> {
    let Some(settings) = settings else {
        return Ok(None);
    };
    let mut registry = EmailServiceRegistry::from_settings(&settings)?;
    registry.take(&settings.service).map(Some)
}
