//! Configuração do cliente de geoprocessamento
//!
//! Carregável de um arquivo JSON; variáveis de ambiente (via `.env`)
//! completam os campos sensíveis que não devem ir para o arquivo.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuração principal
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// URL base do serviço de geoprocessamento (até o nome da task)
    pub service_url: String,

    /// URL base do portal (para descoberta de autenticação e emissão
    /// de token)
    pub portal_url: String,

    /// Nome da task de geoprocessamento dentro do serviço
    #[serde(default = "default_task_name")]
    pub task_name: String,

    /// Token estático de último recurso
    #[serde(default)]
    pub static_token: Option<String>,

    /// Client secret para emissão programática de token
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Validade solicitada do token emitido, em minutos
    #[serde(default = "default_token_expiration")]
    pub token_expiration_minutes: u32,

    /// WKID alvo da geometria submetida
    #[serde(default = "default_target_wkid")]
    pub target_wkid: i32,

    /// Intervalo entre polls, em segundos
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Teto de tentativas de polling
    #[serde(default = "default_poll_attempts")]
    pub max_poll_attempts: u32,
}

fn default_task_name() -> String {
    "Simular Área de Compensação".to_string()
}

fn default_token_expiration() -> u32 {
    // Um ano, a validade solicitada pelo fluxo de emissão
    525_600
}

fn default_target_wkid() -> i32 {
    4674
}

fn default_poll_interval() -> u64 {
    2
}

fn default_poll_attempts() -> u32 {
    60
}

impl Config {
    /// Carrega a configuração de um arquivo JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.apply_env();
        Ok(config)
    }

    /// Monta a configuração somente do ambiente
    pub fn from_env() -> Result<Self> {
        let service_url = std::env::var("GP_SERVICE_URL")
            .context("GP_SERVICE_URL not set (and no config file given)")?;
        let portal_url = std::env::var("GP_PORTAL_URL")
            .unwrap_or_else(|_| derive_portal_url(&service_url));

        let mut config = Self {
            service_url,
            portal_url,
            task_name: default_task_name(),
            static_token: None,
            client_secret: None,
            token_expiration_minutes: default_token_expiration(),
            target_wkid: default_target_wkid(),
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: default_poll_attempts(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Sobrepõe os campos sensíveis com variáveis de ambiente
    fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("GP_TASK_NAME") {
            self.task_name = name;
        }
        if let Ok(token) = std::env::var("GP_STATIC_TOKEN") {
            self.static_token = Some(token);
        }
        if let Ok(secret) = std::env::var("GP_CLIENT_SECRET") {
            self.client_secret = Some(secret);
        }
    }

    /// Intervalo de polling como `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Deduz a raiz do portal a partir da URL do serviço
/// (`https://host/server/rest/services/...` → `https://host/portal`)
fn derive_portal_url(service_url: &str) -> String {
    let root = service_url
        .find("/rest/")
        .or_else(|| service_url.find("/services/"))
        .map(|i| &service_url[..i])
        .unwrap_or(service_url);
    format!("{}/portal", root.trim_end_matches('/'))
}
