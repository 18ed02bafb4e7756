use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::connections::schema::{mask_secrets, validate_submission};
use crate::errors::AppError;
use crate::logs::LogBook;
use crate::models::connection::{
    ConnectionStatus, Integration, IntegrationConfig, IntegrationKind,
};
use crate::models::log_entry::{LogEntry, LogLevel};

/// Checks that a configuration can reach its channel.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    async fn probe(&self, config: &IntegrationConfig) -> Result<(), String>;
}

/// Demo probe: any configuration that passed the form gate connects.
pub struct DemoProbe;

#[async_trait]
impl ConnectionProbe for DemoProbe {
    async fn probe(&self, _config: &IntegrationConfig) -> Result<(), String> {
        Ok(())
    }
}

/// Read model with secrets masked.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationView {
    pub id: Uuid,
    pub kind: IntegrationKind,
    pub name: String,
    pub status: ConnectionStatus,
    pub config: Option<Value>,
    pub last_error: Option<String>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Integration> for IntegrationView {
    fn from(i: &Integration) -> Self {
        Self {
            id: i.id,
            kind: i.kind,
            name: i.name.clone(),
            status: i.status,
            config: i.config.as_ref().map(|c| mask_secrets(i.kind, c)),
            last_error: i.last_error.clone(),
            last_tested_at: i.last_tested_at,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

pub struct ConnectionRegistry {
    integrations: RwLock<Vec<Integration>>,
    probe: Arc<dyn ConnectionProbe>,
    log: Arc<LogBook>,
}

impl ConnectionRegistry {
    pub fn new(probe: Arc<dyn ConnectionProbe>, log: Arc<LogBook>) -> Self {
        Self {
            integrations: RwLock::new(Vec::new()),
            probe,
            log,
        }
    }

    pub async fn create(&self, kind: IntegrationKind, name: &str) -> Result<IntegrationView, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
        let now = Utc::now();
        let integration = Integration {
            id: Uuid::new_v4(),
            kind,
            name: name.trim().to_string(),
            status: ConnectionStatus::Disconnected,
            config: None,
            last_error: None,
            last_tested_at: None,
            created_at: now,
            updated_at: now,
        };
        let view = IntegrationView::from(&integration);
        self.integrations.write().await.push(integration);
        Ok(view)
    }

    pub async fn list(&self) -> Vec<IntegrationView> {
        self.integrations
            .read()
            .await
            .iter()
            .map(IntegrationView::from)
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<IntegrationView, AppError> {
        self.integrations
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .map(IntegrationView::from)
            .ok_or_else(|| not_found(id))
    }

    /// Saves a configuration form. Rejected submissions leave the
    /// integration untouched; accepted ones go to `pending` and are probed.
    pub async fn configure(
        &self,
        id: Uuid,
        values: &BTreeMap<String, String>,
    ) -> Result<IntegrationView, AppError> {
        let config = {
            let mut integrations = self.integrations.write().await;
            let integration = integrations
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| not_found(id))?;

            let config =
                validate_submission(integration.kind, values).map_err(AppError::InvalidFields)?;
            integration.config = Some(config.clone());
            integration.status = ConnectionStatus::Pending;
            integration.last_error = None;
            integration.updated_at = Utc::now();
            config
        };

        info!(integration_id = %id, "Integration configured, probing");
        self.run_probe(id, &config).await
    }

    /// Re-probes a configured integration.
    pub async fn test(&self, id: Uuid) -> Result<IntegrationView, AppError> {
        let config = {
            let integrations = self.integrations.read().await;
            let integration = integrations
                .iter()
                .find(|i| i.id == id)
                .ok_or_else(|| not_found(id))?;
            match (&integration.status, &integration.config) {
                (ConnectionStatus::Disconnected, _) | (_, None) => {
                    return Err(AppError::InvalidTransition(format!(
                        "Integration {id} must be configured and enabled before testing"
                    )))
                }
                (_, Some(config)) => config.clone(),
            }
        };
        self.run_probe(id, &config).await
    }

    pub async fn disable(&self, id: Uuid) -> Result<IntegrationView, AppError> {
        let mut integrations = self.integrations.write().await;
        let integration = integrations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found(id))?;
        if !integration
            .status
            .can_transition_to(ConnectionStatus::Disconnected)
        {
            return Err(AppError::InvalidTransition(format!(
                "Integration {id} is already disconnected"
            )));
        }
        integration.status = ConnectionStatus::Disconnected;
        integration.updated_at = Utc::now();
        Ok(IntegrationView::from(&*integration))
    }

    async fn run_probe(&self, id: Uuid, config: &IntegrationConfig) -> Result<IntegrationView, AppError> {
        let result = self.probe.probe(config).await;

        let mut integrations = self.integrations.write().await;
        let integration = integrations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found(id))?;

        let next = match &result {
            Ok(()) => ConnectionStatus::Connected,
            Err(_) => ConnectionStatus::Error,
        };
        // Disabled while the probe was running: keep it disabled.
        if integration.status.can_transition_to(next) {
            integration.status = next;
            integration.last_error = result.as_ref().err().cloned();
            integration.last_tested_at = Some(Utc::now());
            integration.updated_at = Utc::now();
        }
        let view = IntegrationView::from(&*integration);
        drop(integrations);

        match result {
            Ok(()) => {
                info!(integration_id = %id, "Integration connected");
                self.activity(LogLevel::Info, format!("{} connected", view.name), id)
                    .await;
            }
            Err(e) => {
                warn!(integration_id = %id, error = %e, "Connection test failed");
                self.activity(LogLevel::Error, format!("{} connection failed: {e}", view.name), id)
                    .await;
            }
        }
        Ok(view)
    }

    async fn activity(&self, level: LogLevel, message: String, id: Uuid) {
        self.log
            .append(
                LogEntry::new(level, "connections", message)
                    .with_details(json!({ "integration_id": id })),
            )
            .await;
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Integration {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProbe;

    #[async_trait]
    impl ConnectionProbe for FailingProbe {
        async fn probe(&self, _config: &IntegrationConfig) -> Result<(), String> {
            Err("401 Unauthorized".to_string())
        }
    }

    fn registry(probe: Arc<dyn ConnectionProbe>) -> ConnectionRegistry {
        ConnectionRegistry::new(probe, Arc::new(LogBook::new()))
    }

    fn whatsapp_form(access_token: &str) -> BTreeMap<String, String> {
        [
            ("phone_number_id", "109876543210"),
            ("access_token", access_token),
            ("business_account_id", "556677889900"),
            ("webhook_url", "https://shop.example.com/wa"),
            ("webhook_verify_token", "verify-me"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[tokio::test]
    async fn test_blank_access_token_is_rejected() {
        let r = registry(Arc::new(DemoProbe));
        let created = r
            .create(IntegrationKind::WhatsappBusiness, "Main WhatsApp")
            .await
            .unwrap();
        let err = r.configure(created.id, &whatsapp_form("")).await.unwrap_err();
        match err {
            AppError::InvalidFields(fields) => assert_eq!(fields[0].field, "access_token"),
            other => panic!("unexpected {other:?}"),
        }
        let after = r.get(created.id).await.unwrap();
        assert_eq!(after.status, ConnectionStatus::Disconnected);
        assert!(after.config.is_none());
    }

    #[tokio::test]
    async fn test_complete_form_connects() {
        let r = registry(Arc::new(DemoProbe));
        let created = r
            .create(IntegrationKind::WhatsappBusiness, "Main WhatsApp")
            .await
            .unwrap();
        let view = r
            .configure(created.id, &whatsapp_form("EAAGsecret"))
            .await
            .unwrap();
        assert_eq!(view.status, ConnectionStatus::Connected);
        assert!(view.last_tested_at.is_some());
        let config = view.config.unwrap();
        assert_eq!(config["type"], "whatsapp-business");
        assert_ne!(config["access_token"], "EAAGsecret");
    }

    #[tokio::test]
    async fn test_failed_probe_moves_to_error() {
        let r = registry(Arc::new(FailingProbe));
        let created = r.create(IntegrationKind::WhatsappBusiness, "WA").await.unwrap();
        let view = r
            .configure(created.id, &whatsapp_form("EAAGsecret"))
            .await
            .unwrap();
        assert_eq!(view.status, ConnectionStatus::Error);
        assert_eq!(view.last_error.as_deref(), Some("401 Unauthorized"));
    }

    #[tokio::test]
    async fn test_cannot_test_disconnected() {
        let r = registry(Arc::new(DemoProbe));
        let created = r.create(IntegrationKind::Telegram, "Bot").await.unwrap();
        assert!(matches!(
            r.test(created.id).await,
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_disable_then_disable_again() {
        let r = registry(Arc::new(DemoProbe));
        let created = r.create(IntegrationKind::WhatsappBusiness, "WA").await.unwrap();
        r.configure(created.id, &whatsapp_form("tok")).await.unwrap();

        let disabled = r.disable(created.id).await.unwrap();
        assert_eq!(disabled.status, ConnectionStatus::Disconnected);
        assert!(matches!(
            r.disable(created.id).await,
            Err(AppError::InvalidTransition(_))
        ));
        assert!(r.test(created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let r = registry(Arc::new(DemoProbe));
        assert!(matches!(
            r.create(IntegrationKind::Webhook, " ").await,
            Err(AppError::Validation(_))
        ));
    }
}
