use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationKind {
    WhatsappBusiness,
    Instagram,
    Telegram,
    EmailSmtp,
    SmsTwilio,
    Webhook,
}

impl IntegrationKind {
    pub const ALL: [IntegrationKind; 6] = [
        IntegrationKind::WhatsappBusiness,
        IntegrationKind::Instagram,
        IntegrationKind::Telegram,
        IntegrationKind::EmailSmtp,
        IntegrationKind::SmsTwilio,
        IntegrationKind::Webhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationKind::WhatsappBusiness => "whatsapp-business",
            IntegrationKind::Instagram => "instagram",
            IntegrationKind::Telegram => "telegram",
            IntegrationKind::EmailSmtp => "email-smtp",
            IntegrationKind::SmsTwilio => "sms-twilio",
            IntegrationKind::Webhook => "webhook",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Pending,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// disconnected → pending → connected; any configured state may fall to
    /// error on a failed probe; enabled states may be disabled.
    pub fn can_transition_to(&self, next: ConnectionStatus) -> bool {
        use ConnectionStatus::*;
        match (self, next) {
            (_, Pending) => true,
            (Pending | Error | Connected, Connected) => true,
            (Pending | Connected | Error, Error) => true,
            (Pending | Connected | Error, Disconnected) => true,
            _ => false,
        }
    }
}

/// Typed configuration, one variant per integration field set. Keys match
/// the form field keys of the schema table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum IntegrationConfig {
    WhatsappBusiness {
        phone_number_id: String,
        access_token: String,
        business_account_id: String,
        webhook_url: String,
        webhook_verify_token: String,
    },
    Instagram {
        page_id: String,
        access_token: String,
        app_secret: String,
        #[serde(default)]
        webhook_url: Option<String>,
    },
    Telegram {
        bot_token: String,
        bot_username: String,
        #[serde(default)]
        webhook_url: Option<String>,
    },
    EmailSmtp {
        host: String,
        port: String,
        username: String,
        password: String,
        from_address: String,
        security: String,
    },
    SmsTwilio {
        account_sid: String,
        auth_token: String,
        from_number: String,
        #[serde(default)]
        messaging_service_sid: Option<String>,
    },
    Webhook {
        url: String,
        method: String,
        #[serde(default)]
        secret: Option<String>,
        #[serde(default)]
        headers: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Integration {
    pub id: Uuid,
    pub kind: IntegrationKind,
    pub name: String,
    pub status: ConnectionStatus,
    pub config: Option<IntegrationConfig>,
    pub last_error: Option<String>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lifecycle() {
        use ConnectionStatus::*;
        assert!(Disconnected.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Connected));
        assert!(Connected.can_transition_to(Error));
        assert!(Connected.can_transition_to(Disconnected));
        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Disconnected.can_transition_to(Error));
    }

    #[test]
    fn test_kind_tag_matches_serde() {
        for kind in IntegrationKind::ALL {
            let tag = serde_json::to_value(kind).unwrap();
            assert_eq!(tag, serde_json::Value::String(kind.as_str().to_string()));
        }
    }

    #[test]
    fn test_config_keys_are_snake_case() {
        let config = IntegrationConfig::SmsTwilio {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15550100".to_string(),
            messaging_service_sid: None,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "sms-twilio");
        assert_eq!(json["account_sid"], "AC123");
        assert_eq!(json["from_number"], "+15550100");
        assert!(json.get("accountSid").is_none());
    }
}
