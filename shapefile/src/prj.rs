//! Resolução heurística da referência espacial a partir do texto .prj
//!
//! Não há parsing de WKT: a referência é inferida por marcadores
//! textuais em ordem fixa de prioridade. SIRGAS e WGS são testados
//! antes do fallback UTM/EPSG porque definições UTM frequentemente
//! embutem a string do datum WGS.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

/// WKID padrão do processo: SIRGAS 2000 geográfico
pub const DEFAULT_WKID: i32 = 4674;

/// Zona UTM assumida quando o .prj indica UTM mas nenhum código de
/// autoridade é extraível (SIRGAS 2000 / UTM 23S, centro-sul do Brasil)
pub const FALLBACK_UTM_WKID: i32 = 31983;

/// Identificador de sistema de referência de coordenadas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialReference {
    pub wkid: i32,
    pub latest_wkid: Option<i32>,
}

impl SpatialReference {
    pub fn new(wkid: i32) -> Self {
        Self {
            wkid,
            latest_wkid: None,
        }
    }
}

impl Default for SpatialReference {
    fn default() -> Self {
        Self::new(DEFAULT_WKID)
    }
}

fn authority_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"AUTHORITY\["EPSG",\s*"?(\d+)"?\]"#).unwrap())
}

fn wkid_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:WKID\s*=\s*|EPSG:)(\d+)").unwrap())
}

/// Resolve a referência espacial do texto .prj, na ordem de prioridade
/// documentada; sem texto ou sem casamento, mantém o padrão do processo
pub fn resolve(prj_text: Option<&str>) -> SpatialReference {
    let Some(text) = prj_text else {
        debug!("no .prj entry, assuming WKID {}", DEFAULT_WKID);
        return SpatialReference::default();
    };

    // WKT da Esri usa underscores ("SIRGAS_2000_UTM_Zone_23S")
    let normalized = text.to_uppercase().replace('_', " ");

    if normalized.contains("4674") || normalized.contains("SIRGAS 2000") {
        return SpatialReference::new(4674);
    }
    if normalized.contains("4326") || normalized.contains("WGS 84") {
        return SpatialReference::new(4326);
    }
    if normalized.contains("3857") || normalized.contains("WEB MERCATOR") {
        return SpatialReference::new(3857);
    }

    if normalized.contains("UTM") || normalized.contains("UNIVERSAL TRANSVERSE MERCATOR") {
        // A última AUTHORITY do WKT é a do sistema projetado
        if let Some(code) = authority_re()
            .captures_iter(text)
            .last()
            .and_then(|c| c[1].parse::<i32>().ok())
        {
            debug!(wkid = code, "UTM authority code extracted from .prj");
            return SpatialReference::new(code);
        }
        warn!(
            "UTM projection without extractable authority code, assuming WKID {}",
            FALLBACK_UTM_WKID
        );
        return SpatialReference::new(FALLBACK_UTM_WKID);
    }

    if let Some(code) = authority_re()
        .captures_iter(text)
        .last()
        .and_then(|c| c[1].parse::<i32>().ok())
    {
        return SpatialReference::new(code);
    }
    if let Some(code) = wkid_token_re()
        .captures(text)
        .and_then(|c| c[1].parse::<i32>().ok())
    {
        return SpatialReference::new(code);
    }

    debug!("no spatial reference marker in .prj, assuming WKID {}", DEFAULT_WKID);
    SpatialReference::default()
}
