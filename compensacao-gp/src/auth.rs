//! Resolução de credenciais em cadeia de fallback
//!
//! Cinco camadas avaliadas em curto-circuito: credencial em cache
//! válida, renovação de credencial expirada, descoberta + sign-in,
//! emissão programática OAuth2 e, por último, o token estático
//! configurado. A falha de uma camada nunca interrompe a cadeia; só o
//! esgotamento das cinco é fatal para a submissão.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{esri_error, AnalysisError};

/// Credencial de acesso ao serviço; substituída sempre por inteiro,
/// nunca atualizada parcialmente
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at_epoch_ms: Option<i64>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at_epoch_ms: Option<i64>) -> Self {
        Self {
            token: token.into(),
            expires_at_epoch_ms,
        }
    }

    /// Expirada quando o instante de expiração é conhecido e já passou;
    /// sem expiração conhecida, a credencial é considerada utilizável
    pub fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at_epoch_ms, Some(expires) if expires <= now_ms)
    }
}

/// Camada de identidade externa (gerenciador de credenciais do portal)
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Credencial em cache para a URL do serviço, se houver
    async fn find_credential(&self, service_url: &str) -> Option<Credential>;

    /// Round-trip de sign-in/renovação contra a camada de identidade
    async fn check_sign_in_status(&self, service_url: &str) -> Result<(), AnalysisError>;

    /// Informações de autenticação do servidor foram descobertas
    async fn find_server_info(&self, service_url: &str) -> bool;

    /// Emissão programática de token de longa duração
    async fn issue_token(&self, config: &Config) -> Result<Credential, AnalysisError>;
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Resolve uma credencial pela cadeia de cinco camadas
pub async fn resolve_credential<I: IdentityProvider>(
    config: &Config,
    identity: &I,
) -> Result<Credential, AnalysisError> {
    let service_url = &config.service_url;
    let now = now_epoch_ms();

    match identity.find_credential(service_url).await {
        Some(credential) if !credential.is_expired(now) => {
            debug!("using cached credential");
            return Ok(credential);
        }
        Some(_) => {
            // Camada 2: cache expirado, tenta renovar
            warn!("cached credential expired, attempting refresh");
            match identity.check_sign_in_status(service_url).await {
                Ok(()) => {
                    if let Some(refreshed) = identity.find_credential(service_url).await {
                        if !refreshed.is_expired(now_epoch_ms()) {
                            info!("credential refreshed");
                            return Ok(refreshed);
                        }
                    }
                }
                Err(err) => warn!("credential refresh failed: {}", err),
            }
        }
        None => {
            // Camada 3: sem cache, descoberta + sign-in
            if !identity.find_server_info(service_url).await {
                warn!("no server authentication info discovered, trying sign-in anyway");
            }
            match identity.check_sign_in_status(service_url).await {
                Ok(()) => {
                    if let Some(credential) = identity.find_credential(service_url).await {
                        if !credential.is_expired(now_epoch_ms()) {
                            info!("credential acquired via sign-in");
                            return Ok(credential);
                        }
                    }
                }
                Err(err) => warn!("sign-in attempt failed: {}", err),
            }
        }
    }

    // Camada 4: emissão OAuth2 com client secret
    if config.client_secret.is_some() {
        match identity.issue_token(config).await {
            Ok(credential) => {
                info!("token issued via OAuth2");
                return Ok(credential);
            }
            Err(err) => warn!("OAuth2 token issuance failed: {}", err),
        }
    }

    // Camada 5: token estático (modo degradado)
    if let Some(token) = &config.static_token {
        warn!("falling back to statically configured token (degraded mode)");
        return Ok(Credential::new(token.clone(), None));
    }

    Err(AnalysisError::Authentication(
        "nenhum token disponível após esgotar todas as camadas de autenticação".to_string(),
    ))
}

/// Identidade concreta contra o portal, via HTTP
pub struct PortalIdentity {
    client: reqwest::Client,
}

impl PortalIdentity {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for PortalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for PortalIdentity {
    /// Fora de um portal autenticado não há armazém de credenciais
    async fn find_credential(&self, _service_url: &str) -> Option<Credential> {
        None
    }

    async fn check_sign_in_status(&self, _service_url: &str) -> Result<(), AnalysisError> {
        Err(AnalysisError::Authentication(
            "no interactive sign-in available".to_string(),
        ))
    }

    async fn find_server_info(&self, _service_url: &str) -> bool {
        false
    }

    async fn issue_token(&self, config: &Config) -> Result<Credential, AnalysisError> {
        let client_secret = config.client_secret.as_deref().ok_or_else(|| {
            AnalysisError::Authentication("no client secret configured".to_string())
        })?;

        let url = format!(
            "{}/tokens/generateToken",
            config.portal_url.trim_end_matches('/')
        );
        let expiration = config.token_expiration_minutes.to_string();
        let params = [
            ("f", "json"),
            ("client", "referer"),
            ("referer", config.portal_url.as_str()),
            ("expiration", expiration.as_str()),
            ("client_secret", client_secret),
        ];

        debug!(url = %url, "requesting OAuth2 token");
        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AnalysisError::transport(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::transport(format!("invalid token response: {}", e)))?;

        if let Some((code, message)) = esri_error(&body) {
            return Err(AnalysisError::Authentication(format!(
                "token endpoint error {}: {}",
                code, message
            )));
        }

        let token = body
            .get("token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                AnalysisError::Authentication("token endpoint returned no token".to_string())
            })?;
        let expires = body.get("expires").and_then(|e| e.as_i64());

        Ok(Credential::new(token, expires))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> Config {
        serde_json::from_str(
            r#"{"service_url": "https://gis.example/rest/services/GP/GPServer",
                "portal_url": "https://gis.example/portal"}"#,
        )
        .unwrap()
    }

    /// Identidade falsa com comportamento configurável por camada
    struct FakeIdentity {
        cached: Option<Credential>,
        refreshed: Option<Credential>,
        sign_in_ok: bool,
        issued: Option<Credential>,
        sign_in_calls: AtomicUsize,
    }

    impl Default for FakeIdentity {
        fn default() -> Self {
            Self {
                cached: None,
                refreshed: None,
                sign_in_ok: false,
                issued: None,
                sign_in_calls: AtomicUsize::new(0),
            }
        }
    }

    impl IdentityProvider for FakeIdentity {
        async fn find_credential(&self, _url: &str) -> Option<Credential> {
            if self.sign_in_calls.load(Ordering::SeqCst) > 0 {
                self.refreshed.clone().or_else(|| self.cached.clone())
            } else {
                self.cached.clone()
            }
        }

        async fn check_sign_in_status(&self, _url: &str) -> Result<(), AnalysisError> {
            self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
            if self.sign_in_ok {
                Ok(())
            } else {
                Err(AnalysisError::Authentication("sign-in refused".to_string()))
            }
        }

        async fn find_server_info(&self, _url: &str) -> bool {
            true
        }

        async fn issue_token(&self, _config: &Config) -> Result<Credential, AnalysisError> {
            self.issued.clone().ok_or_else(|| {
                AnalysisError::Authentication("issuance unavailable".to_string())
            })
        }
    }

    fn future_ms() -> i64 {
        now_epoch_ms() + 3_600_000
    }

    #[tokio::test]
    async fn test_tier1_cached_unexpired() {
        let identity = FakeIdentity {
            cached: Some(Credential::new("cached", Some(future_ms()))),
            ..Default::default()
        };
        let credential = resolve_credential(&test_config(), &identity).await.unwrap();
        assert_eq!(credential.token, "cached");
        assert_eq!(identity.sign_in_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tier2_expired_cache_refreshes() {
        let identity = FakeIdentity {
            cached: Some(Credential::new("stale", Some(1))),
            refreshed: Some(Credential::new("fresh", Some(future_ms()))),
            sign_in_ok: true,
            ..Default::default()
        };
        let credential = resolve_credential(&test_config(), &identity).await.unwrap();
        assert_eq!(credential.token, "fresh");
        assert_eq!(identity.sign_in_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tier4_oauth_issuance() {
        let mut config = test_config();
        config.client_secret = Some("secret".to_string());

        let identity = FakeIdentity {
            issued: Some(Credential::new("issued", Some(future_ms()))),
            ..Default::default()
        };
        let credential = resolve_credential(&config, &identity).await.unwrap();
        assert_eq!(credential.token, "issued");
    }

    #[tokio::test]
    async fn test_tier5_static_fallback() {
        let mut config = test_config();
        config.static_token = Some("static".to_string());

        let identity = FakeIdentity::default();
        let credential = resolve_credential(&config, &identity).await.unwrap();
        assert_eq!(credential.token, "static");
        assert!(credential.expires_at_epoch_ms.is_none());
    }

    #[tokio::test]
    async fn test_exhaustion_is_fatal() {
        let identity = FakeIdentity::default();
        assert!(matches!(
            resolve_credential(&test_config(), &identity).await,
            Err(AnalysisError::Authentication(_))
        ));
    }

    #[test]
    fn test_expiry() {
        let credential = Credential::new("t", Some(100));
        assert!(credential.is_expired(100));
        assert!(credential.is_expired(101));
        assert!(!credential.is_expired(99));
        assert!(!Credential::new("t", None).is_expired(i64::MAX));
    }
}
