//! Taxonomia de erros da análise
//!
//! Todos os erros encerram a tentativa de análise corrente; nenhum é
//! repetido automaticamente além da própria cadência fixa do polling.

use thiserror::Error;

/// Erros da análise de compensação
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Entrada inválida (shapefile malformado, geometria ausente ou
    /// duplicada). Recuperável localmente, nunca re-tentado.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Nenhuma credencial utilizável após esgotar a cadeia de fallback,
    /// ou token rejeitado pelo serviço (códigos 498/401)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Falha de rede ou de protocolo, com dica de causa provável
    #[error("Transport error: {message} ({hint})")]
    Transport { message: String, hint: String },

    /// O job remoto reportou falha; mensagens agregadas do serviço
    #[error("Geoprocessing job failed: {0}")]
    JobFailure(String),

    /// O job remoto foi cancelado no servidor
    #[error("Geoprocessing job was cancelled")]
    Cancelled,

    /// Teto de tentativas de polling atingido sem status terminal
    #[error("Geoprocessing job timed out after {attempts} polls")]
    Timeout { attempts: u32 },

    /// Job concluído mas nenhum candidato a URL de relatório encontrado
    /// nos resultados
    #[error("Job succeeded but no report document was found in the results")]
    ReportNotFound,
}

impl AnalysisError {
    /// Erro de validação a partir de um erro do decoder, preservando a
    /// mensagem ao usuário
    pub fn from_shapefile(err: shapefile::ShapefileError) -> Self {
        Self::Validation(err.user_message())
    }

    /// Erro de transporte com a dica padrão de causas prováveis
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            hint: "possíveis causas: CORS, token expirado ou serviço indisponível".to_string(),
        }
    }
}

/// Detecta o envelope de erro do serviço (`{"error": {code, message}}`),
/// presente mesmo sob HTTP 200
pub fn esri_error(body: &serde_json::Value) -> Option<(i64, String)> {
    let error = body.get("error")?;
    let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown service error")
        .to_string();
    Some((code, message))
}

/// Converte um envelope de erro do serviço no erro da análise
/// (498/401 são tokens inválidos ou expirados)
pub fn from_esri_error(code: i64, message: String) -> AnalysisError {
    if code == 498 || code == 401 {
        AnalysisError::Authentication(format!("token rejected by service: {}", message))
    } else {
        AnalysisError::transport(format!("service error {}: {}", code, message))
    }
}
