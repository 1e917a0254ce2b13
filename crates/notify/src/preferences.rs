//! Notification preferences (`notify.json`) and their resolution.
//!
//! Every section and every key is optional at the type level. Sections are
//! resolved into fully-populated settings only when a channel needs them, so
//! a missing key surfaces as [`NotifyError::Configuration`] on the send that
//! uses it rather than at load time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::traits::NotifyError;

/// Default location of the preferences file, relative to the working directory.
pub const DEFAULT_PREFERENCES_PATH: &str = "notify.json";

/// Env var selecting the preferences file.
pub const PREFERENCES_PATH_ENV: &str = "BLANKLY_NOTIFY_PATH";

// ── Raw document ────────────────────────────────────────────────────

/// The preferences document as written on disk.
///
/// Sections are kept as raw JSON and only type-checked when a channel
/// resolves them, so a malformed `email` section does not stop chat delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSection {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailSection {
    #[serde(default)]
    pub smtp_server: Option<String>,
    #[serde(default, deserialize_with = "port_from_number_or_string")]
    pub port: Option<u16>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub receiver_email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSection {
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Accepts `465` as well as `"465"`.
fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(port)) => Ok(Some(port)),
        Some(Port::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid port '{text}'"))),
    }
}

/// Type-check one raw section. `null` counts as absent.
fn decode_section<T: DeserializeOwned>(
    raw: Option<&Value>,
    section: &str,
) -> Result<Option<T>, NotifyError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value).map(Some).map_err(|e| {
            NotifyError::Configuration(format!("invalid '{section}' section: {e}"))
        }),
    }
}

/// Set `key` inside a raw section, creating the section if needed.
fn set_key(section: &mut Option<Value>, key: &str, value: Value) {
    let slot = section.get_or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        map.insert(key.to_string(), value);
    }
}

// ── Resolved settings ───────────────────────────────────────────────

/// The `text` section with every key present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSettings {
    /// Carrier identifier as written in the preferences (not yet validated).
    pub provider: String,
    pub phone_number: String,
}

/// The `email` section with every key present.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub smtp_server: String,
    pub port: u16,
    pub sender_email: String,
    pub receiver_email: String,
    pub password: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("smtp_server", &self.smtp_server)
            .field("port", &self.port)
            .field("sender_email", &self.sender_email)
            .field("receiver_email", &self.receiver_email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The `chat` section with every key present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub webhook_url: String,
}

fn require<T: Clone>(value: &Option<T>, section: &str, key: &str) -> Result<T, NotifyError> {
    value
        .clone()
        .ok_or_else(|| NotifyError::Configuration(format!("missing '{section}.{key}'")))
}

fn missing_section(section: &str) -> NotifyError {
    NotifyError::Configuration(format!("missing '{section}' section"))
}

impl NotifyPreferences {
    /// Parse preferences from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, NotifyError> {
        serde_json::from_str(json)
            .map_err(|e| NotifyError::Configuration(format!("invalid notify.json: {e}")))
    }

    /// Load preferences from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NotifyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NotifyError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Resolve the `text` section.
    pub fn text(&self) -> Result<TextSettings, NotifyError> {
        let section = decode_section::<TextSection>(self.text.as_ref(), "text")?
            .ok_or_else(|| missing_section("text"))?;
        Ok(TextSettings {
            provider: require(&section.provider, "text", "provider")?,
            phone_number: require(&section.phone_number, "text", "phone_number")?,
        })
    }

    /// Resolve the `email` section.
    pub fn email(&self) -> Result<SmtpSettings, NotifyError> {
        let section = decode_section::<EmailSection>(self.email.as_ref(), "email")?
            .ok_or_else(|| missing_section("email"))?;
        Ok(SmtpSettings {
            smtp_server: require(&section.smtp_server, "email", "smtp_server")?,
            port: require(&section.port, "email", "port")?,
            sender_email: require(&section.sender_email, "email", "sender_email")?,
            receiver_email: require(&section.receiver_email, "email", "receiver_email")?,
            password: require(&section.password, "email", "password")?,
        })
    }

    /// Resolve the `chat` section.
    ///
    /// A missing section and a missing URL both yield [`NotifyError::WebhookConfig`].
    pub fn chat(&self) -> Result<ChatSettings, NotifyError> {
        decode_section::<ChatSection>(self.chat.as_ref(), "chat")?
            .and_then(|c| c.webhook_url)
            .filter(|url| !url.is_empty())
            .map(|webhook_url| ChatSettings { webhook_url })
            .ok_or(NotifyError::WebhookConfig)
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Apply overrides from the process environment.
    ///
    /// Convention: `BLANKLY_NOTIFY_SECTION_KEY` overrides `section.key`, e.g.
    /// - `BLANKLY_NOTIFY_TEXT_PHONE_NUMBER` -> `text.phone_number`
    /// - `BLANKLY_NOTIFY_EMAIL_PASSWORD` -> `email.password`
    /// - `BLANKLY_NOTIFY_CHAT_WEBHOOK_URL` -> `chat.webhook_url`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(&format!("BLANKLY_NOTIFY_{key}"));

        const STRING_KEYS: [(&str, &str, &str); 7] = [
            ("TEXT_PROVIDER", "text", "provider"),
            ("TEXT_PHONE_NUMBER", "text", "phone_number"),
            ("EMAIL_SMTP_SERVER", "email", "smtp_server"),
            ("EMAIL_SENDER_EMAIL", "email", "sender_email"),
            ("EMAIL_RECEIVER_EMAIL", "email", "receiver_email"),
            ("EMAIL_PASSWORD", "email", "password"),
            ("CHAT_WEBHOOK_URL", "chat", "webhook_url"),
        ];

        for (var, section, key) in STRING_KEYS {
            if let Some(v) = get(var) {
                set_key(self.section_mut(section), key, Value::String(v));
            }
        }
        if let Some(v) = get("EMAIL_PORT") {
            match v.parse::<u16>() {
                Ok(port) => set_key(&mut self.email, "port", Value::from(port)),
                Err(_) => tracing::warn!(value = %v, "ignoring invalid BLANKLY_NOTIFY_EMAIL_PORT"),
            }
        }
    }

    fn section_mut(&mut self, section: &str) -> &mut Option<Value> {
        match section {
            "text" => &mut self.text,
            "email" => &mut self.email,
            _ => &mut self.chat,
        }
    }
}

// ── SMS gateways ────────────────────────────────────────────────────

/// Carriers whose email-to-SMS gateway is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmsProvider {
    Att,
    Boost,
    Cricket,
    Sprint,
    TMobile,
    UsCellular,
    Verizon,
    VirginMobile,
}

/// Carrier identifier → gateway domain suffix.
pub static GATEWAY_TABLE: [(SmsProvider, &str, &str); 8] = [
    (SmsProvider::Att, "att", "@txt.att.net"),
    (SmsProvider::Boost, "boost", "@smsmyboostmobile.com"),
    (SmsProvider::Cricket, "cricket", "@sms.cricketwireless.net"),
    (SmsProvider::Sprint, "sprint", "@messaging.sprintpcs.com"),
    (SmsProvider::TMobile, "t_mobile", "@tmomail.net"),
    (SmsProvider::UsCellular, "us_cellular", "@email.uscc.net"),
    (SmsProvider::Verizon, "verizon", "@vtext.com"),
    (SmsProvider::VirginMobile, "virgin_mobile", "@vmobl.com"),
];

impl SmsProvider {
    pub const ALL: [SmsProvider; 8] = [
        SmsProvider::Att,
        SmsProvider::Boost,
        SmsProvider::Cricket,
        SmsProvider::Sprint,
        SmsProvider::TMobile,
        SmsProvider::UsCellular,
        SmsProvider::Verizon,
        SmsProvider::VirginMobile,
    ];

    fn entry(self) -> &'static (SmsProvider, &'static str, &'static str) {
        // GATEWAY_TABLE is indexed in declaration order.
        &GATEWAY_TABLE[self as usize]
    }

    /// Identifier used in `notify.json` (e.g. `"t_mobile"`).
    pub fn id(self) -> &'static str {
        self.entry().1
    }

    /// Email domain suffix, including the leading `@`.
    pub fn gateway_suffix(self) -> &'static str {
        self.entry().2
    }

    /// Address the carrier forwards to `phone_number` as a text message.
    pub fn gateway_address(self, phone_number: &str) -> String {
        format!("{phone_number}{}", self.gateway_suffix())
    }
}

impl FromStr for SmsProvider {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GATEWAY_TABLE
            .iter()
            .find(|(_, id, _)| *id == s)
            .map(|(provider, _, _)| *provider)
            .ok_or_else(|| NotifyError::UnsupportedProvider(s.to_string()))
    }
}

impl fmt::Display for SmsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ── Sources ─────────────────────────────────────────────────────────

/// Supplies the current preferences. Called once per send; implementations
/// must not assume the result is cached by the caller.
pub trait PreferencesSource: Send + Sync {
    fn load(&self) -> Result<NotifyPreferences, NotifyError>;
}

/// Reads `notify.json` from disk on every call, then applies env overrides.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `BLANKLY_NOTIFY_PATH` if set, else `notify.json`.
    ///
    /// Loads `.env` first (silently ignored if missing).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let path = std::env::var(PREFERENCES_PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFERENCES_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferencesSource for FilePreferences {
    fn load(&self) -> Result<NotifyPreferences, NotifyError> {
        let mut prefs = if self.path.exists() {
            NotifyPreferences::from_file(&self.path)?
        } else {
            tracing::debug!(
                path = %self.path.display(),
                "preferences file not found, relying on environment"
            );
            NotifyPreferences::default()
        };
        prefs.apply_env_overrides();
        Ok(prefs)
    }
}

/// Fixed in-memory preferences.
#[derive(Debug, Clone, Default)]
pub struct StaticPreferences(pub NotifyPreferences);

impl PreferencesSource for StaticPreferences {
    fn load(&self) -> Result<NotifyPreferences, NotifyError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FULL: &str = r#"{
        "text": { "provider": "verizon", "phone_number": "5551234567" },
        "email": {
            "smtp_server": "smtp.example.com",
            "port": 465,
            "sender_email": "bot@example.com",
            "receiver_email": "me@example.com",
            "password": "hunter2"
        },
        "chat": { "webhook_url": "https://chat.googleapis.com/v1/spaces/X/messages" }
    }"#;

    #[test]
    fn parse_full_document() {
        let prefs = NotifyPreferences::from_json(FULL).unwrap();
        let text = prefs.text().unwrap();
        assert_eq!(text.provider, "verizon");
        assert_eq!(text.phone_number, "5551234567");

        let email = prefs.email().unwrap();
        assert_eq!(email.port, 465);
        assert_eq!(email.receiver_email, "me@example.com");

        let chat = prefs.chat().unwrap();
        assert!(chat.webhook_url.starts_with("https://chat.googleapis.com"));
    }

    #[test]
    fn missing_section_is_configuration_error() {
        let prefs = NotifyPreferences::from_json("{}").unwrap();
        match prefs.email().unwrap_err() {
            NotifyError::Configuration(msg) => assert!(msg.contains("'email'"), "got: {msg}"),
            other => panic!("expected Configuration error, got: {other:?}"),
        }
    }

    #[test]
    fn missing_key_names_section_and_key() {
        let prefs = NotifyPreferences::from_json(r#"{"text": {"provider": "att"}}"#).unwrap();
        let err = prefs.text().unwrap_err();
        assert!(err.to_string().contains("text.phone_number"), "got: {err}");
    }

    #[test]
    fn missing_webhook_is_webhook_config_error() {
        let no_section = NotifyPreferences::default();
        assert!(matches!(no_section.chat(), Err(NotifyError::WebhookConfig)));

        let empty = NotifyPreferences::from_json(r#"{"chat": {}}"#).unwrap();
        assert!(matches!(empty.chat(), Err(NotifyError::WebhookConfig)));
    }

    #[test]
    fn malformed_section_only_fails_its_own_channel() {
        let prefs = NotifyPreferences::from_json(
            r#"{"email": {"port": [465]}, "chat": {"webhook_url": "https://chat.example/hook"}}"#,
        )
        .unwrap();
        assert_eq!(prefs.chat().unwrap().webhook_url, "https://chat.example/hook");

        let err = prefs.email().unwrap_err();
        assert!(err.to_string().contains("invalid 'email' section"), "got: {err}");
    }

    #[test]
    fn port_may_be_written_as_string() {
        let prefs = NotifyPreferences::from_json(
            r#"{"email": {"smtp_server": "smtp.example.com", "port": "465",
                "sender_email": "a@example.com", "receiver_email": "b@example.com",
                "password": "pw"}}"#,
        )
        .unwrap();
        assert_eq!(prefs.email().unwrap().port, 465);
    }

    #[test]
    fn overrides_create_missing_sections() {
        let mut prefs = NotifyPreferences::default();
        prefs.apply_overrides(|k| (k == "BLANKLY_NOTIFY_EMAIL_PORT").then(|| "587".to_string()));
        assert_eq!(prefs.email, Some(serde_json::json!({"port": 587})));
        assert!(prefs.text.is_none());
    }

    #[test]
    fn malformed_json_is_configuration_error() {
        let err = NotifyPreferences::from_json("{ not json").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn smtp_settings_debug_redacts_password() {
        let prefs = NotifyPreferences::from_json(FULL).unwrap();
        let debug = format!("{:?}", prefs.email().unwrap());
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn overrides_fill_and_replace_keys() {
        let vars = HashMap::from([
            ("BLANKLY_NOTIFY_CHAT_WEBHOOK_URL", "https://hooks.example/abc"),
            ("BLANKLY_NOTIFY_EMAIL_PASSWORD", "from-env"),
            ("BLANKLY_NOTIFY_EMAIL_PORT", "not-a-port"),
        ]);
        let mut prefs = NotifyPreferences::from_json(FULL).unwrap();
        prefs.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(prefs.chat().unwrap().webhook_url, "https://hooks.example/abc");
        let email = prefs.email().unwrap();
        assert_eq!(email.password, "from-env");
        assert_eq!(email.port, 465); // invalid override ignored
    }

    #[test]
    fn gateway_table_matches_provider_order() {
        for provider in SmsProvider::ALL {
            assert_eq!(provider.id().parse::<SmsProvider>().unwrap(), provider);
            assert!(provider.gateway_suffix().starts_with('@'));
        }
        assert_eq!(SmsProvider::TMobile.gateway_suffix(), "@tmomail.net");
        assert_eq!(
            SmsProvider::Att.gateway_address("5550001111"),
            "5550001111@txt.att.net"
        );
    }

    #[test]
    fn unknown_provider_rejected() {
        let err = "tracfone".parse::<SmsProvider>().unwrap_err();
        assert!(matches!(err, NotifyError::UnsupportedProvider(ref p) if p == "tracfone"));
    }

    #[test]
    fn file_source_rereads_on_every_load() {
        let dir = std::env::temp_dir().join(format!("blankly-notify-prefs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("notify.json");

        std::fs::write(&path, r#"{"chat": {"webhook_url": "https://a.example"}}"#).unwrap();
        let source = FilePreferences::new(&path);
        assert_eq!(source.path(), path.as_path());
        assert_eq!(source.load().unwrap().chat().unwrap().webhook_url, "https://a.example");

        std::fs::write(&path, r#"{"chat": {"webhook_url": "https://b.example"}}"#).unwrap();
        assert_eq!(source.load().unwrap().chat().unwrap().webhook_url, "https://b.example");

        std::fs::remove_dir_all(&dir).ok();
    }
}
