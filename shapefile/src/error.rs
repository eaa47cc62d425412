//! Tipos de erro do crate shapefile

use thiserror::Error;

/// Erros que podem ocorrer durante a decodificação de um shapefile
#[derive(Debug, Error)]
pub enum ShapefileError {
    /// Erro de I/O ao ler o arquivo
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container ZIP corrompido ou ilegível
    #[error("Invalid ZIP archive: {0}")]
    InvalidArchive(String),

    /// Arquivos obrigatórios ausentes no ZIP (.shp, .shx, .dbf)
    #[error("Missing required shapefile entries: {}", missing.join(", "))]
    MissingFiles {
        /// Extensões ausentes (ex: ".shp")
        missing: Vec<String>,
        /// Nomes das entradas encontradas
        found: Vec<String>,
    },

    /// O `.shp` é menor que o header mínimo de 100 bytes
    #[error("Undersized .shp file: {len} bytes (minimum 100)")]
    Undersized { len: usize },

    /// Magic number do header diferente de 9994
    #[error("Bad shapefile code: expected 9994, found {found}")]
    BadFileCode { found: i32 },

    /// Tipo de geometria diferente de 5 (polígono)
    #[error("Unsupported shape type: {found} (only 5 = Polygon)")]
    UnsupportedShapeType { found: i32 },

    /// Nenhum registro de polígono válido encontrado no stream
    #[error("No valid polygon feature found in .shp stream")]
    NoValidFeature,

    /// Registro truncado ou com offsets fora do buffer
    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: usize, reason: String },

    /// Anel com menos de 3 pontos antes do fechamento
    #[error("Invalid ring {ring}: {points} points (minimum 3 before closing)")]
    InvalidRing { ring: usize, points: usize },
}

impl ShapefileError {
    /// Cria um erro de registro corrompido com contexto
    pub fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            offset,
            reason: reason.into(),
        }
    }

    /// Mensagem voltada ao usuário final (em português), no formato
    /// que a interface de upload exibe.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFiles { missing, found } => {
                let encontrados = if found.is_empty() {
                    "Nenhum".to_string()
                } else {
                    found.join(", ")
                };
                format!(
                    "O arquivo ZIP não contém todos os arquivos necessários do shapefile.\n\n\
                     Arquivos encontrados: {}\n\
                     Arquivos faltando: {}\n\n\
                     Um shapefile completo precisa de:\n\
                     - .shp (geometria)\n\
                     - .shx (índice)\n\
                     - .dbf (atributos)\n\
                     - .prj (projeção - opcional)",
                    encontrados,
                    missing.join(", ")
                )
            }
            Self::Undersized { .. } => {
                "O arquivo .shp está muito pequeno ou corrompido. \
                 Tamanho mínimo esperado: 100 bytes."
                    .to_string()
            }
            Self::BadFileCode { found } => format!(
                "O arquivo .shp não parece ser um shapefile válido.\n\n\
                 Código de arquivo esperado: 9994\n\
                 Código encontrado: {}",
                found
            ),
            Self::UnsupportedShapeType { found } => format!(
                "O shapefile não contém polígonos.\n\n\
                 Tipo de geometria encontrado: {}\n\
                 Tipo esperado: 5 (Polygon)\n\n\
                 Esta análise requer geometrias do tipo Polygon.",
                found
            ),
            Self::NoValidFeature => {
                "Nenhuma feature válida encontrada no shapefile.".to_string()
            }
            other => format!("Erro ao ler o shapefile: {}", other),
        }
    }
}
