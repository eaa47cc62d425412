//! Tipos de saída do decoder

use geo::Polygon;

use crate::header::ShapefileHeader;
use crate::prj::SpatialReference;
use crate::record::PolygonRecord;

/// Resultado completo da decodificação de um ZIP de shapefile
#[derive(Debug, Clone)]
pub struct DecodedShapefile {
    /// Header validado do stream .shp
    pub header: ShapefileHeader,

    /// Primeiro registro de polígono válido
    pub record: PolygonRecord,

    /// Referência espacial inferida do .prj (ou o padrão do processo)
    pub spatial_reference: SpatialReference,
}

impl DecodedShapefile {
    /// Geometria decodificada como `geo::Polygon`
    pub fn polygon(&self) -> Polygon<f64> {
        self.record.to_polygon()
    }

    /// Resumo de diagnóstico para logs
    pub fn summary(&self) -> String {
        format!(
            "record #{}: {} ring(s), {} point(s), WKID {}",
            self.record.record_number,
            self.record.rings.len(),
            self.record.point_count(),
            self.spatial_reference.wkid
        )
    }
}

/// Resultado da validação de pré-envio de um arquivo ZIP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadValidation {
    /// O arquivo pode seguir para análise
    pub valid: bool,

    /// Mensagem para o usuário final (em português)
    pub message: String,

    /// Número de entradas no ZIP
    pub file_count: usize,
}
