//! Orquestração do job de geoprocessamento
//!
//! Submete a análise, conduz o polling em cadência fixa até um status
//! terminal ou o teto de tentativas, normaliza os resultados e extrai a
//! classificação do relatório. O analisador possui no máximo um job por
//! vez; iniciar uma nova análise com outra em andamento é violação de
//! pré-condição do chamador.

pub mod client;
pub mod job;
pub mod params;
pub mod results;

use serde_json::Value;
use tracing::{info, warn};

use crate::auth::{resolve_credential, IdentityProvider};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::report::{self, AnalysisOutcome};
use client::GpService;
use job::{GeoprocessingJob, JobStatus};
use params::AnalysisInput;

/// Pausa entre os passos de progresso rumo a 100 na conclusão
const COMPLETION_STEP_DELAY_MS: u64 = 50;

/// Condutor da análise de compensação
pub struct Analyzer<S, I> {
    config: Config,
    service: S,
    identity: I,
    job: Option<GeoprocessingJob>,
    outcome: Option<AnalysisOutcome>,
    busy: bool,
}

impl<S: GpService, I: IdentityProvider> Analyzer<S, I> {
    pub fn new(config: Config, service: S, identity: I) -> Self {
        Self {
            config,
            service,
            identity,
            job: None,
            outcome: None,
            busy: false,
        }
    }

    /// Job corrente, se houver
    pub fn job(&self) -> Option<&GeoprocessingJob> {
        self.job.as_ref()
    }

    /// Último desfecho produzido
    pub fn outcome(&self) -> Option<&AnalysisOutcome> {
        self.outcome.as_ref()
    }

    /// Descarta job e desfecho em memória; não emite cancelamento ao
    /// serviço remoto
    pub fn clear(&mut self) {
        self.job = None;
        self.outcome = None;
    }

    /// Conduz a análise completa: validação, credencial, submissão,
    /// polling, resultados e classificação
    pub async fn analyze(
        &mut self,
        input: &AnalysisInput,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if self.busy {
            return Err(AnalysisError::Validation(
                "Já existe uma análise em andamento.".to_string(),
            ));
        }

        self.busy = true;
        let result = self.run(input).await;
        self.busy = false;

        match result {
            // Relatório ausente não derruba um job concluído
            Err(AnalysisError::ReportNotFound) => {
                warn!("job succeeded but no report document was found");
                let outcome = AnalysisOutcome::unclassified(None);
                self.outcome = Some(outcome.clone());
                Ok(outcome)
            }
            Ok(outcome) => {
                self.outcome = Some(outcome.clone());
                Ok(outcome)
            }
            Err(err) => Err(err),
        }
    }

    async fn run(&mut self, input: &AnalysisInput) -> Result<AnalysisOutcome, AnalysisError> {
        // Pré-condições locais antes de qualquer chamada de rede
        let submission = params::build_submission(input)?;

        let credential = resolve_credential(&self.config, &self.identity).await?;
        let token = credential.token.as_str();

        let job_id = self.service.submit_job(&submission, token).await?;
        self.job = Some(GeoprocessingJob::submitted(job_id.clone()));
        self.outcome = None;

        self.poll_to_completion(token).await?;
        self.finish(token).await
    }

    /// Cadência fixa até status terminal ou teto de tentativas
    async fn poll_to_completion(&mut self, token: &str) -> Result<(), AnalysisError> {
        let max_attempts = self.config.max_poll_attempts;
        let interval = self.config.poll_interval();

        let job_id = match &self.job {
            Some(job) => job.job_id.clone(),
            None => {
                return Err(AnalysisError::Validation(
                    "Nenhum job em andamento.".to_string(),
                ))
            }
        };

        for attempt in 1..=max_attempts {
            tokio::time::sleep(interval).await;

            let report = self.service.job_status(&job_id, token).await?;
            let job = self.job.as_mut().ok_or_else(|| {
                AnalysisError::Validation("Nenhum job em andamento.".to_string())
            })?;
            job.record_messages(&report.messages);
            job.observe_status(report.status);

            match report.status {
                JobStatus::Succeeded => {
                    info!(job_id = %job.job_id, attempt, "geoprocessing job succeeded");
                    return Ok(());
                }
                JobStatus::Failed => {
                    let detail = failure_detail(&report.messages);
                    return Err(AnalysisError::JobFailure(rewrite_failure(&detail)));
                }
                JobStatus::Cancelled => return Err(AnalysisError::Cancelled),
                JobStatus::TimedOut => {
                    return Err(AnalysisError::Timeout { attempts: attempt })
                }
                JobStatus::Submitted | JobStatus::Executing => {
                    job.advance_progress(attempt, max_attempts);
                }
            }
        }

        if let Some(job) = self.job.as_mut() {
            job.observe_status(JobStatus::TimedOut);
        }
        Err(AnalysisError::Timeout {
            attempts: max_attempts,
        })
    }

    /// Progresso final, resultados e classificação do relatório
    async fn finish(&mut self, token: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let job_id = {
            let job = self.job.as_mut().ok_or_else(|| {
                AnalysisError::Validation("Nenhum job em andamento.".to_string())
            })?;
            // Passos limitados até 100: o observador nunca vê um salto
            // maior que o passo fixo
            while job.completion_step().is_some() {
                tokio::time::sleep(std::time::Duration::from_millis(COMPLETION_STEP_DELAY_MS))
                    .await;
            }
            job.job_id.clone()
        };

        let payload: Value = self.service.job_results(&job_id, token).await?;
        let report_url =
            results::find_report_url(&payload).ok_or(AnalysisError::ReportNotFound)?;
        let final_url = client::append_token(&report_url, token);

        match self.service.fetch_report(&final_url, token).await {
            Ok(text) => match report::classify(&text) {
                Some(mut outcome) => {
                    outcome.report_url = Some(final_url);
                    Ok(outcome)
                }
                None => Ok(AnalysisOutcome::unclassified(Some(final_url))),
            },
            // Relatório inacessível: o job ainda conclui, sem resumo
            Err(err) => {
                warn!("could not fetch report document: {}", err);
                Ok(AnalysisOutcome::unclassified(Some(final_url)))
            }
        }
    }
}

/// Filtra as mensagens de erro do job; sem mensagens tipadas como erro,
/// o log bruto é devolvido verbatim
fn failure_detail(messages: &[Value]) -> String {
    let errors: Vec<&str> = messages
        .iter()
        .filter(|m| {
            m.get("type").and_then(|t| t.as_str()) == Some("esriJobMessageTypeError")
        })
        .filter_map(|m| m.get("description").and_then(|d| d.as_str()))
        .collect();

    if errors.is_empty() {
        serde_json::to_string(messages).unwrap_or_else(|_| "Job falhou".to_string())
    } else {
        errors.join("\n")
    }
}

/// Reescreve a falha conhecida de geometria inválida em uma mensagem
/// acionável, preservando o detalhe técnico
fn rewrite_failure(detail: &str) -> String {
    if detail.contains("não possui geometrias válidas") {
        format!(
            "O arquivo ZIP não contém geometrias válidas.\n\n\
             Por favor, verifique se:\n\
             1. O arquivo ZIP contém um shapefile completo (.shp, .shx, .dbf, .prj)\n\
             2. O shapefile possui geometrias válidas (polígonos)\n\
             3. O arquivo não está corrompido\n\n\
             Detalhes técnicos: {}",
            detail
        )
    } else {
        format!("Job falhou: {}", detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_detail_filters_errors() {
        let messages = vec![
            json!({"type": "esriJobMessageTypeInformative", "description": "Executing"}),
            json!({"type": "esriJobMessageTypeError", "description": "Falha A"}),
            json!({"type": "esriJobMessageTypeError", "description": "Falha B"}),
        ];
        assert_eq!(failure_detail(&messages), "Falha A\nFalha B");
    }

    #[test]
    fn test_failure_detail_without_errors_is_verbatim() {
        let messages = vec![json!({"type": "esriJobMessageTypeInformative", "description": "x"})];
        let detail = failure_detail(&messages);
        assert!(detail.contains("esriJobMessageTypeInformative"));
    }

    #[test]
    fn test_rewrite_known_geometry_failure() {
        let detail = "ERROR 000732: a camada não possui geometrias válidas";
        let rewritten = rewrite_failure(detail);
        assert!(rewritten.contains("shapefile completo"));
        assert!(rewritten.contains("Detalhes técnicos"));
        assert!(rewritten.contains(detail));

        assert_eq!(rewrite_failure("outro erro"), "Job falhou: outro erro");
    }
}
