//! Configuration shape of the portal backend.

use serde::{Deserialize, Serialize};
use startuphafen::prelude::*;

#[derive(Debug, Serialize, Deserialize)]
pub struct PortalConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub keycloak: KeycloakConfig,
    #[serde(default)]
    pub mail: Option<MailConfig>,
    #[serde(default)]
    pub tenants: Vec<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeycloakConfig {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub from: String,
}

pub fn portal_schema() -> ObjectSchema<PortalConfig> {
    ObjectSchema::new()
        .required(
            "server",
            FieldKind::Object(
                ObjectRules::new()
                    .optional("host", FieldKind::String)
                    .required("port", FieldKind::port()),
            ),
        )
        .required(
            "database",
            FieldKind::Object(
                ObjectRules::new()
                    .required("url", FieldKind::String)
                    .optional("password", FieldKind::String),
            ),
        )
        .required(
            "keycloak",
            FieldKind::Object(
                ObjectRules::new()
                    .required("url", FieldKind::String)
                    .required("realm", FieldKind::String)
                    .required("client_id", FieldKind::String)
                    .optional("client_secret", FieldKind::String),
            ),
        )
        .optional(
            "mail",
            FieldKind::Object(
                ObjectRules::new()
                    .required("host", FieldKind::String)
                    .required("port", FieldKind::port())
                    .required("from", FieldKind::String),
            ),
        )
        .optional("tenants", FieldKind::array_of(FieldKind::String))
        .optional("logging", FieldKind::Object(LoggingConfig::rules()))
}
