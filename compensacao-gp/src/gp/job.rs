//! Estado do job de geoprocessamento
//!
//! As transições são estritamente para frente e o percentual de
//! progresso nunca regride; um observador do estado vê uma linha do
//! tempo monotônica mesmo quando o serviço responde fora de ordem.

use serde_json::Value;

/// Status do job, espelhando os códigos do serviço
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Executing,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl JobStatus {
    /// Interpreta o código de status do serviço; códigos desconhecidos
    /// (novos estados intermediários) são tratados como execução
    pub fn parse(raw: &str) -> Self {
        match raw {
            "esriJobSubmitted" | "esriJobNew" | "esriJobWaiting" => Self::Submitted,
            "esriJobSucceeded" => Self::Succeeded,
            "esriJobFailed" => Self::Failed,
            "esriJobCancelled" | "esriJobCancelling" => Self::Cancelled,
            "esriJobTimedOut" => Self::TimedOut,
            _ => Self::Executing,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Cancelled | Self::TimedOut
        )
    }
}

/// Piso do progresso logo após a submissão
pub const PROGRESS_FLOOR: u8 = 5;

/// Teto do progresso enquanto o job não conclui
pub const PROGRESS_CEILING: u8 = 95;

/// Maior salto visível de progresso em uma atualização
pub const PROGRESS_STEP: u8 = 5;

/// Job de geoprocessamento em andamento, posse exclusiva do analisador
#[derive(Debug, Clone)]
pub struct GeoprocessingJob {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub messages: Vec<String>,
}

impl GeoprocessingJob {
    /// Cria o job logo após a submissão bem-sucedida
    pub fn submitted(job_id: String) -> Self {
        Self {
            job_id,
            status: JobStatus::Submitted,
            progress: PROGRESS_FLOOR,
            messages: Vec::new(),
        }
    }

    /// Aplica um status observado; estados terminais nunca revertem
    pub fn observe_status(&mut self, status: JobStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
    }

    /// Avança o progresso em função das tentativas decorridas:
    /// linear entre o piso e o teto, nunca regredindo
    pub fn advance_progress(&mut self, attempt: u32, max_attempts: u32) {
        let span = (PROGRESS_CEILING - PROGRESS_FLOOR) as u32;
        let linear = PROGRESS_FLOOR as u32 + attempt * span / max_attempts.max(1);
        let target = linear.min(PROGRESS_CEILING as u32) as u8;
        if target > self.progress {
            self.progress = target;
        }
    }

    /// Próximo passo rumo a 100 ao concluir, limitado a
    /// `PROGRESS_STEP` por atualização; retorna `None` quando já em 100
    pub fn completion_step(&mut self) -> Option<u8> {
        if self.progress >= 100 {
            return None;
        }
        self.progress = (self.progress + PROGRESS_STEP).min(100);
        Some(self.progress)
    }

    /// Acrescenta mensagens do serviço ao log do job
    pub fn record_messages(&mut self, messages: &[Value]) {
        for message in messages {
            let text = message
                .get("description")
                .and_then(|d| d.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| message.to_string());
            if !self.messages.contains(&text) {
                self.messages.push(text);
            }
        }
    }
}
