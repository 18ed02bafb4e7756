//! Form schema per integration kind and submission validation.
//!
//! The field tables drive both the generic configuration form and the
//! save gate: a submission is accepted only when every required field is
//! present and every filled field passes its type check. Accepted values
//! are turned into the typed `IntegrationConfig` variant for the kind.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::FieldError;
use crate::models::connection::{IntegrationConfig, IntegrationKind};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Password,
    Url,
    Email,
    Tel,
    Number,
    Select,
    Textarea,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub placeholder: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [&'static str]>,
}

const fn field(
    key: &'static str,
    label: &'static str,
    field_type: FieldType,
    required: bool,
    placeholder: &'static str,
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        field_type,
        required,
        placeholder,
        options: None,
    }
}

const fn select(
    key: &'static str,
    label: &'static str,
    options: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        field_type: FieldType::Select,
        required: true,
        placeholder: "",
        options: Some(options),
    }
}

use FieldType::*;

const WHATSAPP_BUSINESS: &[FieldSpec] = &[
    field("phone_number_id", "Phone Number ID", Text, true, "123456789012345"),
    field("access_token", "Access Token", Password, true, "EAAG..."),
    field("business_account_id", "Business Account ID", Text, true, "987654321098765"),
    field("webhook_url", "Webhook URL", Url, true, "https://example.com/webhooks/whatsapp"),
    field("webhook_verify_token", "Webhook Verify Token", Password, true, "my-verify-token"),
];

const INSTAGRAM: &[FieldSpec] = &[
    field("page_id", "Page ID", Text, true, "1784140..."),
    field("access_token", "Access Token", Password, true, "IGQV..."),
    field("app_secret", "App Secret", Password, true, ""),
    field("webhook_url", "Webhook URL", Url, false, "https://example.com/webhooks/instagram"),
];

const TELEGRAM: &[FieldSpec] = &[
    field("bot_token", "Bot Token", Password, true, "123456:ABC-DEF..."),
    field("bot_username", "Bot Username", Text, true, "@my_store_bot"),
    field("webhook_url", "Webhook URL", Url, false, "https://example.com/webhooks/telegram"),
];

const EMAIL_SMTP: &[FieldSpec] = &[
    field("host", "SMTP Host", Text, true, "smtp.example.com"),
    field("port", "Port", Number, true, "587"),
    field("username", "Username", Text, true, "apikey"),
    field("password", "Password", Password, true, ""),
    field("from_address", "From Address", Email, true, "hello@example.com"),
    select("security", "Security", &["none", "ssl", "tls"]),
];

const SMS_TWILIO: &[FieldSpec] = &[
    field("account_sid", "Account SID", Text, true, "AC..."),
    field("auth_token", "Auth Token", Password, true, ""),
    field("from_number", "From Number", Tel, true, "+15550100"),
    field("messaging_service_sid", "Messaging Service SID", Text, false, "MG..."),
];

const WEBHOOK: &[FieldSpec] = &[
    field("url", "Endpoint URL", Url, true, "https://example.com/hooks/flowdesk"),
    select("method", "HTTP Method", &["POST", "PUT"]),
    field("secret", "Signing Secret", Password, false, ""),
    field("headers", "Extra Headers", Textarea, false, "X-Api-Key: ..."),
];

/// Ordered form fields for an integration kind.
pub fn fields_for(kind: IntegrationKind) -> &'static [FieldSpec] {
    match kind {
        IntegrationKind::WhatsappBusiness => WHATSAPP_BUSINESS,
        IntegrationKind::Instagram => INSTAGRAM,
        IntegrationKind::Telegram => TELEGRAM,
        IntegrationKind::EmailSmtp => EMAIL_SMTP,
        IntegrationKind::SmsTwilio => SMS_TWILIO,
        IntegrationKind::Webhook => WEBHOOK,
    }
}

/// Gates a form submission. Returns every field error at once; keys not in
/// the schema are ignored.
pub fn validate_submission(
    kind: IntegrationKind,
    values: &BTreeMap<String, String>,
) -> Result<IntegrationConfig, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut object = Map::new();
    object.insert("type".to_string(), Value::String(kind.as_str().to_string()));

    for spec in fields_for(kind) {
        let value = values.get(spec.key).map(|v| v.trim()).unwrap_or("");
        if value.is_empty() {
            if spec.required {
                errors.push(FieldError {
                    field: spec.key.to_string(),
                    message: format!("{} is required", spec.label),
                });
            }
            continue;
        }
        if let Some(message) = type_error(spec, value) {
            errors.push(FieldError {
                field: spec.key.to_string(),
                message,
            });
            continue;
        }
        object.insert(spec.key.to_string(), Value::String(value.to_string()));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| {
        vec![FieldError {
            field: "config".to_string(),
            message: format!("configuration does not match {}: {e}", kind.as_str()),
        }]
    })
}

fn type_error(spec: &FieldSpec, value: &str) -> Option<String> {
    match spec.field_type {
        Number if value.parse::<f64>().is_err() => Some(format!("{} must be a number", spec.label)),
        Email if !looks_like_email(value) => {
            Some(format!("{} must be an email address", spec.label))
        }
        Url if !(value.starts_with("http://") || value.starts_with("https://")) => {
            Some(format!("{} must start with http:// or https://", spec.label))
        }
        Select => {
            let options = spec.options.unwrap_or(&[]);
            (!options.contains(&value))
                .then(|| format!("{} must be one of: {}", spec.label, options.join(", ")))
        }
        _ => None,
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Replaces non-empty password values with a fixed mask.
pub fn mask_secrets(kind: IntegrationKind, config: &IntegrationConfig) -> Value {
    let mut value = serde_json::to_value(config).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        for spec in fields_for(kind).iter().filter(|s| s.field_type == Password) {
            if let Some(Value::String(secret)) = map.get_mut(spec.key) {
                if !secret.is_empty() {
                    *secret = "••••••••".to_string();
                }
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whatsapp_values() -> BTreeMap<String, String> {
        [
            ("phone_number_id", "109876543210"),
            ("access_token", "EAAGsecret"),
            ("business_account_id", "556677889900"),
            ("webhook_url", "https://shop.example.com/wa"),
            ("webhook_verify_token", "verify-me"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_whatsapp_required_fields() {
        let required: Vec<&str> = fields_for(IntegrationKind::WhatsappBusiness)
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key)
            .collect();
        assert_eq!(
            required,
            vec![
                "phone_number_id",
                "access_token",
                "business_account_id",
                "webhook_url",
                "webhook_verify_token"
            ]
        );
    }

    #[test]
    fn test_missing_access_token_is_rejected() {
        let mut values = whatsapp_values();
        values.insert("access_token".to_string(), "   ".to_string());
        let errors = validate_submission(IntegrationKind::WhatsappBusiness, &values).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "access_token");
    }

    #[test]
    fn test_complete_submission_builds_typed_config() {
        let config =
            validate_submission(IntegrationKind::WhatsappBusiness, &whatsapp_values()).unwrap();
        match config {
            IntegrationConfig::WhatsappBusiness {
                phone_number_id,
                access_token,
                ..
            } => {
                assert_eq!(phone_number_id, "109876543210");
                assert_eq!(access_token, "EAAGsecret");
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn test_all_errors_reported_together() {
        let errors =
            validate_submission(IntegrationKind::EmailSmtp, &BTreeMap::new()).unwrap_err();
        assert_eq!(errors.len(), fields_for(IntegrationKind::EmailSmtp).len());
    }

    #[test]
    fn test_type_checks() {
        let values: BTreeMap<String, String> = [
            ("host", "smtp.example.com"),
            ("port", "five-eight-seven"),
            ("username", "apikey"),
            ("password", "pw"),
            ("from_address", "not-an-email"),
            ("security", "starttls"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let errors = validate_submission(IntegrationKind::EmailSmtp, &values).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["port", "from_address", "security"]);
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let values: BTreeMap<String, String> = [("url", "https://hooks.example.com"), ("method", "POST")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = validate_submission(IntegrationKind::Webhook, &values).unwrap();
        assert_eq!(
            config,
            IntegrationConfig::Webhook {
                url: "https://hooks.example.com".to_string(),
                method: "POST".to_string(),
                secret: None,
                headers: None,
            }
        );
    }

    #[test]
    fn test_every_kind_accepts_a_full_form() {
        for kind in IntegrationKind::ALL {
            let values: BTreeMap<String, String> = fields_for(kind)
                .iter()
                .map(|f| {
                    let v = match f.field_type {
                        Url => "https://example.com/x".to_string(),
                        Email => "ops@example.com".to_string(),
                        Number => "587".to_string(),
                        Select => f.options.unwrap()[0].to_string(),
                        _ => "value".to_string(),
                    };
                    (f.key.to_string(), v)
                })
                .collect();
            assert!(
                validate_submission(kind, &values).is_ok(),
                "{} rejected a complete form",
                kind.as_str()
            );
        }
    }

    #[test]
    fn test_secrets_are_masked() {
        let config =
            validate_submission(IntegrationKind::WhatsappBusiness, &whatsapp_values()).unwrap();
        let masked = mask_secrets(IntegrationKind::WhatsappBusiness, &config);
        assert_eq!(masked["access_token"], "••••••••");
        assert_eq!(masked["phone_number_id"], "109876543210");
    }
}
