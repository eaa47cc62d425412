//! Normalização dos resultados do job e extração da URL do relatório
//!
//! O serviço devolve os resultados em três formatos distintos conforme
//! a versão: array puro, objeto com `results` array, ou objeto com
//! `results` objeto. Tudo é normalizado em uma sequência canônica na
//! borda, antes de qualquer extração.

use serde_json::Value;
use tracing::debug;

/// Sufixo que identifica um documento de relatório
const REPORT_SUFFIX: &str = ".html";

/// Campos de fallback do objeto externo, em ordem fixa
const FALLBACK_FIELDS: [&str; 3] = ["outputUrl", "url", "fileUrl"];

/// Normaliza o payload de resultados em uma sequência de itens
pub fn normalize(payload: &Value) -> Vec<Value> {
    if let Some(items) = payload.as_array() {
        return items.clone();
    }
    match payload.get("results") {
        Some(Value::Array(items)) => items.clone(),
        // Objeto indexado por posição: os valores são iterados sem
        // depender da ordem das chaves
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Procura a URL do relatório nos itens normalizados e, em último caso,
/// nos campos de fallback do objeto externo
pub fn find_report_url(payload: &Value) -> Option<String> {
    for item in normalize(payload) {
        if let Some(url) = probe_item(&item) {
            debug!(url = %url, "report URL found in job results");
            return Some(url);
        }
    }

    for field in FALLBACK_FIELDS {
        if let Some(url) = payload.get(field).and_then(|v| v.as_str()) {
            if !url.is_empty() {
                debug!(field, url, "report URL found in fallback field");
                return Some(url.to_string());
            }
        }
    }

    None
}

/// Sonda um item de resultado, na ordem: `value` string, `value.url`,
/// `url`, o próprio item como string
fn probe_item(item: &Value) -> Option<String> {
    let candidates = [
        item.get("value").and_then(|v| v.as_str()),
        item.get("value").and_then(|v| v.get("url")).and_then(|u| u.as_str()),
        item.get("url").and_then(|u| u.as_str()),
        item.as_str(),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|c| c.contains(REPORT_SUFFIX))
        .map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_three_shapes() {
        let bare = json!([{"value": "a"}, {"value": "b"}]);
        assert_eq!(normalize(&bare).len(), 2);

        let array_field = json!({"results": [{"value": "a"}]});
        assert_eq!(normalize(&array_field).len(), 1);

        let object_field = json!({"results": {"0": {"value": "a"}, "1": {"value": "b"}}});
        assert_eq!(normalize(&object_field).len(), 2);

        assert!(normalize(&json!({"jobId": "x"})).is_empty());
    }

    #[test]
    fn test_nested_value_url() {
        let payload = json!({"results": {"0": {"value": {"url": "report.html"}}}});
        assert_eq!(find_report_url(&payload).unwrap(), "report.html");
    }

    #[test]
    fn test_value_string_wins_first() {
        let payload = json!({"results": [
            {"value": "https://srv/out/relatorio.html", "url": "https://srv/other.html"},
        ]});
        assert_eq!(
            find_report_url(&payload).unwrap(),
            "https://srv/out/relatorio.html"
        );
    }

    #[test]
    fn test_item_as_plain_string() {
        let payload = json!(["https://srv/out/relatorio.html"]);
        assert_eq!(
            find_report_url(&payload).unwrap(),
            "https://srv/out/relatorio.html"
        );
    }

    #[test]
    fn test_non_report_values_skipped() {
        let payload = json!({"results": [
            {"value": "42.7"},
            {"value": {"url": "https://srv/out/relatorio.html"}},
        ]});
        assert_eq!(
            find_report_url(&payload).unwrap(),
            "https://srv/out/relatorio.html"
        );
    }

    #[test]
    fn test_fallback_fields_in_order() {
        let payload = json!({"results": [], "url": "u", "outputUrl": "o"});
        assert_eq!(find_report_url(&payload).unwrap(), "o");
    }

    #[test]
    fn test_exhaustion_yields_none() {
        let payload = json!({"results": [{"value": "12"}]});
        assert!(find_report_url(&payload).is_none());
    }
}
