//! Classificação do desfecho a partir do documento de relatório
//!
//! O serviço não expõe um campo estruturado de suficiência: a
//! classificação é extraída do texto do relatório HTML por uma lista
//! ordenada de padrões. O primeiro padrão que casa no texto bruto
//! decide; sem casamento, um teste de palavras-chave sobre o texto sem
//! markup desempata (presença exclusiva de um dos lados).

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Desfecho da análise, derivado exclusivamente de um job concluído
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    /// A área atende ao requisito de compensação
    pub sufficient: bool,

    /// Mensagem ao usuário; vazia quando nenhuma classificação foi
    /// derivável (o job ainda conclui)
    pub message: String,

    /// URL do relatório, quando encontrada
    pub report_url: Option<String>,
}

impl AnalysisOutcome {
    /// Desfecho sem classificação (relatório ilegível ou ambíguo)
    pub fn unclassified(report_url: Option<String>) -> Self {
        Self {
            sufficient: false,
            message: String::new(),
            report_url,
        }
    }
}

fn phrase_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"área\s+(?:é|está)\s+insuficiente",
            r"área\s+insuficiente",
            r"insuficiente.*?área",
            r"área\s+(?:é|está)\s+suficiente",
            r"área\s+suficiente",
            r"suficiente.*?área",
            r"compensação.*?insuficiente",
            r"compensação.*?suficiente",
            r"não\s+atende",
            r"atende.*?requisitos",
        ]
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .unwrap()
        })
        .collect()
    })
}

fn insufficiency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"insuficiente|não\s+atende")
            .case_insensitive(true)
            .build()
            .unwrap()
    })
}

fn sufficiency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"suficiente|atende")
            .case_insensitive(true)
            .build()
            .unwrap()
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Remove markup e normaliza espaços para o teste de palavras-chave
fn strip_markup(html: &str) -> String {
    let without_tags = tag_re().replace_all(html, " ");
    whitespace_re()
        .replace_all(&without_tags, " ")
        .to_lowercase()
}

/// Classifica o texto do relatório; `None` quando nenhuma frase casa e
/// as palavras-chave são ambíguas (ambas ou nenhuma presentes)
pub fn classify(report_text: &str) -> Option<AnalysisOutcome> {
    // Os padrões de frase rodam no texto bruto, antes do strip
    for pattern in phrase_patterns() {
        if let Some(matched) = pattern.find(report_text) {
            let insufficient = insufficiency_re().is_match(matched.as_str());
            debug!(pattern = %pattern.as_str(), matched = matched.as_str(), "report phrase matched");
            return Some(if insufficient {
                AnalysisOutcome {
                    sufficient: false,
                    message: "Área insuficiente para compensação. Continue com a análise"
                        .to_string(),
                    report_url: None,
                }
            } else {
                AnalysisOutcome {
                    sufficient: true,
                    message: "Área suficiente para compensação.".to_string(),
                    report_url: None,
                }
            });
        }
    }

    let text = strip_markup(report_text);
    let has_insufficient = insufficiency_re().is_match(&text);
    let has_sufficient = sufficiency_re().is_match(&text);

    match (has_insufficient, has_sufficient) {
        (true, false) => Some(AnalysisOutcome {
            sufficient: false,
            message: "Área insuficiente para compensação".to_string(),
            report_url: None,
        }),
        (false, true) => Some(AnalysisOutcome {
            sufficient: true,
            message: "Área suficiente para compensação".to_string(),
            report_url: None,
        }),
        _ => {
            warn!("could not determine sufficiency from report text");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_phrase() {
        let outcome = classify("<p>A área é insuficiente para o requisito.</p>").unwrap();
        assert!(!outcome.sufficient);
        assert!(outcome.message.contains("insuficiente"));
    }

    #[test]
    fn test_sufficient_phrase_without_negation() {
        let outcome = classify("<p>A área suficiente foi confirmada.</p>").unwrap();
        assert!(outcome.sufficient);
        assert_eq!(outcome.message, "Área suficiente para compensação.");
    }

    #[test]
    fn test_phrase_order_insufficiency_first() {
        // Ambas as frases presentes: a regra de insuficiência vem antes
        let text = "A área insuficiente; em outro cenário a área suficiente.";
        let outcome = classify(text).unwrap();
        assert!(!outcome.sufficient);
    }

    #[test]
    fn test_nao_atende_is_insufficient() {
        let outcome = classify("O imóvel não atende aos critérios.").unwrap();
        assert!(!outcome.sufficient);
    }

    #[test]
    fn test_keyword_fallback() {
        // Sem frase completa; só a palavra-chave num contexto markup
        let outcome = classify("<td>resultado: SUFICIENTE</td>").unwrap();
        assert!(outcome.sufficient);
    }

    #[test]
    fn test_ambiguous_keywords_yield_none() {
        // "insuficiente" contém "suficiente": ambos os testes casam e
        // nenhuma classificação é produzida pelo fallback
        assert!(classify("<td>INSUFICIENTE</td>").is_none());
        assert!(classify("<td>sem conclusão</td>").is_none());
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<b>Área</b>\n  OK"), " área ok");
    }
}
