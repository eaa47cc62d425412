//! Cliente HTTP do serviço de geoprocessamento
//!
//! O token viaja no corpo da requisição na submissão (nunca na URL de
//! um POST) e como parâmetro de query nos GETs de status e resultados.

use reqwest::multipart;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{esri_error, from_esri_error, AnalysisError};
use crate::gp::job::JobStatus;
use crate::gp::params::Submission;

/// Status observado em um poll, com o log de mensagens do serviço
#[derive(Debug, Clone)]
pub struct JobStatusReport {
    pub status: JobStatus,
    pub messages: Vec<Value>,
}

/// Operações do serviço de geoprocessamento
///
/// Abstraído por trait para que o orquestrador seja testável com um
/// serviço falso, sem rede.
#[allow(async_fn_in_trait)]
pub trait GpService {
    /// Submete o job; a resposta deve conter o identificador
    async fn submit_job(
        &self,
        submission: &Submission,
        token: &str,
    ) -> Result<String, AnalysisError>;

    /// Lê o status corrente do job
    async fn job_status(&self, job_id: &str, token: &str) -> Result<JobStatusReport, AnalysisError>;

    /// Busca o payload de resultados de um job concluído
    async fn job_results(&self, job_id: &str, token: &str) -> Result<Value, AnalysisError>;

    /// Busca o documento de relatório como texto
    async fn fetch_report(&self, url: &str, token: &str) -> Result<String, AnalysisError>;
}

/// Implementação real sobre `reqwest`
pub struct HttpGpService {
    client: reqwest::Client,
    task_url: String,
}

impl HttpGpService {
    /// `service_url` é a URL do serviço; `task_name` é anexado como
    /// segmento de caminho (percent-encoded)
    pub fn new(service_url: &str, task_name: &str) -> Result<Self, AnalysisError> {
        let mut url = reqwest::Url::parse(service_url)
            .map_err(|e| AnalysisError::transport(format!("invalid service URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AnalysisError::transport("service URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(task_name);

        Ok(Self {
            client: reqwest::Client::new(),
            task_url: url.to_string(),
        })
    }

    async fn get_json(&self, url: &str, token: &str) -> Result<Value, AnalysisError> {
        let response = self
            .client
            .get(url)
            .query(&[("token", token), ("f", "json")])
            .send()
            .await
            .map_err(|e| AnalysisError::transport(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::transport(format!("invalid JSON response: {}", e)))?;

        if let Some((code, message)) = esri_error(&body) {
            return Err(from_esri_error(code, message));
        }
        Ok(body)
    }
}

impl GpService for HttpGpService {
    async fn submit_job(
        &self,
        submission: &Submission,
        token: &str,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}/submitJob", self.task_url);
        debug!(url = %url, multipart = submission.has_geometry, "submitting geoprocessing job");

        let request = self.client.post(&url);
        let request = if submission.has_geometry {
            // Multipart: a string JSON da geometria não passa por
            // form-encoding
            let mut form = multipart::Form::new();
            for (name, value) in &submission.fields {
                form = form.text(name.clone(), value.clone());
            }
            form = form.text("token", token.to_string());
            form = form.text("f", "json");
            request.multipart(form)
        } else {
            let mut fields = submission.fields.clone();
            fields.push(("token".to_string(), token.to_string()));
            fields.push(("f".to_string(), "json".to_string()));
            request.form(&fields)
        };

        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::transport(e.to_string()))?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::transport(format!("invalid JSON response: {}", e)))?;

        if let Some((code, message)) = esri_error(&body) {
            return Err(from_esri_error(code, message));
        }

        let job_id = body
            .get("jobId")
            .and_then(|j| j.as_str())
            .ok_or_else(|| {
                AnalysisError::transport("submission response carried no jobId".to_string())
            })?;

        info!(job_id, "geoprocessing job submitted");
        Ok(job_id.to_string())
    }

    async fn job_status(
        &self,
        job_id: &str,
        token: &str,
    ) -> Result<JobStatusReport, AnalysisError> {
        let url = format!("{}/jobs/{}", self.task_url, job_id);
        let body = self.get_json(&url, token).await?;

        let raw = body
            .get("jobStatus")
            .and_then(|s| s.as_str())
            .unwrap_or("esriJobExecuting");
        let messages = body
            .get("messages")
            .and_then(|m| m.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(JobStatusReport {
            status: JobStatus::parse(raw),
            messages,
        })
    }

    async fn job_results(&self, job_id: &str, token: &str) -> Result<Value, AnalysisError> {
        let url = format!("{}/jobs/{}/results", self.task_url, job_id);
        self.get_json(&url, token).await
    }

    async fn fetch_report(&self, url: &str, token: &str) -> Result<String, AnalysisError> {
        let with_token = append_token(url, token);
        let response = self
            .client
            .get(&with_token)
            .send()
            .await
            .map_err(|e| AnalysisError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::transport(format!(
                "report fetch returned HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AnalysisError::transport(e.to_string()))
    }
}

/// Anexa o token como parâmetro de query, se ainda não presente
pub fn append_token(url: &str, token: &str) -> String {
    if token.is_empty() || url.contains("token=") {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", url, separator, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_token() {
        assert_eq!(append_token("https://s/r.html", "t1"), "https://s/r.html?token=t1");
        assert_eq!(
            append_token("https://s/r.html?f=json", "t1"),
            "https://s/r.html?f=json&token=t1"
        );
        // Já tem token: inalterada
        assert_eq!(
            append_token("https://s/r.html?token=x", "t1"),
            "https://s/r.html?token=x"
        );
        assert_eq!(append_token("https://s/r.html", ""), "https://s/r.html");
    }

    #[test]
    fn test_task_url_encoding() {
        let service = HttpGpService::new(
            "https://gis.example/rest/services/GP/GPServer/",
            "Simular Área de Compensação",
        )
        .unwrap();
        assert!(service
            .task_url
            .starts_with("https://gis.example/rest/services/GP/GPServer/Simular%20"));
        assert!(!service.task_url.contains(' '));
    }
}
