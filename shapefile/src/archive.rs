//! Extração do container ZIP enviado pelo usuário
//!
//! O conteúdo é lido inteiramente em memória: os shapefiles aceitos
//! são pequenos (uma área proposta, não uma base cartográfica).

use std::collections::HashMap;
use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::ShapefileError;

/// Extensões obrigatórias de um shapefile completo
const REQUIRED_EXTENSIONS: [&str; 3] = [".shp", ".shx", ".dbf"];

/// Conteúdo extraído do ZIP, indexado pelas extensões do shapefile
#[derive(Debug)]
pub struct ShapefileArchive {
    /// Stream de geometria (.shp)
    pub shp: Vec<u8>,

    /// Índice (.shx), presença obrigatória; o conteúdo não é utilizado
    /// (a varredura dos registros é linear)
    pub shx: Vec<u8>,

    /// Atributos (.dbf), presença obrigatória; o conteúdo não é utilizado
    pub dbf: Vec<u8>,

    /// Texto de projeção (.prj), quando presente
    pub prj: Option<Vec<u8>>,

    /// Número total de entradas no ZIP
    pub file_count: usize,

    /// Nomes (normalizados) das entradas que casaram com extensões do shapefile
    pub matched_names: Vec<String>,
}

/// Extrai um ZIP em memória e localiza as entradas do shapefile
///
/// Os nomes são normalizados para minúsculas e o casamento é feito por
/// sufixo, então `AREA.SHP` e `pasta/area.shp` são aceitos. Entradas de
/// diretório e arquivos não relacionados são ignorados.
pub fn extract(bytes: &[u8]) -> Result<ShapefileArchive, ShapefileError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ShapefileError::InvalidArchive(e.to_string()))?;

    let file_count = zip.len();
    let mut entries: HashMap<String, Vec<u8>> = HashMap::new();
    let mut matched_names = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| ShapefileError::InvalidArchive(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_lowercase();
        let Some(ext) = shapefile_extension(&name) else {
            continue;
        };

        // Primeira ocorrência de cada extensão vence
        if entries.contains_key(ext) {
            continue;
        }

        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content)?;
        matched_names.push(name);
        entries.insert(ext.to_string(), content);
    }

    let missing: Vec<String> = REQUIRED_EXTENSIONS
        .iter()
        .filter(|ext| !entries.contains_key(**ext))
        .map(|ext| ext.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ShapefileError::MissingFiles {
            missing,
            found: matched_names,
        });
    }

    Ok(ShapefileArchive {
        shp: entries.remove(".shp").unwrap_or_default(),
        shx: entries.remove(".shx").unwrap_or_default(),
        dbf: entries.remove(".dbf").unwrap_or_default(),
        prj: entries.remove(".prj"),
        file_count,
        matched_names,
    })
}

/// Decodifica o texto do `.prj` (UTF-8 com fallback Windows-1252,
/// frequente em shapefiles produzidos por ferramentas desktop)
pub fn decode_prj_text(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(data);
            decoded.into_owned()
        }
    }
}

fn shapefile_extension(name: &str) -> Option<&'static str> {
    [".shp", ".shx", ".dbf", ".prj"]
        .into_iter()
        .find(|ext| name.ends_with(ext))
}
