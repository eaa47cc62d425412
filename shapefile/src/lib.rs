//! Decoder e validador de shapefiles ESRI empacotados em ZIP
//!
//! Lê o container ZIP enviado pelo usuário, decodifica o stream binário
//! `.shp` (apenas polígonos, tipo 5) e infere a referência espacial do
//! `.prj` por marcadores textuais. A varredura é linear e retorna a
//! primeira feature válida; o índice `.shx` e os atributos `.dbf` são
//! exigidos no container mas não consultados.
//!
//! ```no_run
//! let bytes = std::fs::read("area.zip")?;
//! let decoded = shapefile::decode_zip(&bytes)?;
//! println!("{}", decoded.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod error;
pub mod header;
pub mod prj;
pub mod record;
pub mod types;

pub use error::ShapefileError;
pub use header::ShapefileHeader;
pub use prj::SpatialReference;
pub use record::PolygonRecord;
pub use types::{DecodedShapefile, UploadValidation};

use tracing::info;

/// Decodifica um ZIP de shapefile em memória até a primeira feature
/// de polígono válida
pub fn decode_zip(bytes: &[u8]) -> Result<DecodedShapefile, ShapefileError> {
    let archive = archive::extract(bytes)?;
    let header = ShapefileHeader::from_bytes(&archive.shp)?;
    let record = record::first_polygon(&archive.shp, &header)?;

    let prj_text = archive.prj.as_deref().map(archive::decode_prj_text);
    let spatial_reference = prj::resolve(prj_text.as_deref());

    let decoded = DecodedShapefile {
        header,
        record,
        spatial_reference,
    };
    info!("shapefile decoded: {}", decoded.summary());
    Ok(decoded)
}

/// Validação de pré-envio: presença das entradas obrigatórias e header
/// do `.shp`, sem varrer os registros
///
/// Erros de validação viram mensagens ao usuário; apenas falhas de
/// leitura do próprio container são propagadas como erro.
pub fn validate_zip(bytes: &[u8]) -> UploadValidation {
    let archive = match archive::extract(bytes) {
        Ok(archive) => archive,
        Err(err) => {
            return UploadValidation {
                valid: false,
                message: err.user_message(),
                file_count: 0,
            }
        }
    };

    match ShapefileHeader::from_bytes(&archive.shp) {
        Ok(_) => UploadValidation {
            valid: true,
            message: "Shapefile válido.".to_string(),
            file_count: archive.file_count,
        },
        Err(err) => UploadValidation {
            valid: false,
            message: err.user_message(),
            file_count: archive.file_count,
        },
    }
}
