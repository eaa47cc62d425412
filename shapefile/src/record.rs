//! Varredura linear dos registros de polígono do stream .shp
//!
//! O índice `.shx` não é consultado: a análise precisa de uma única
//! feature, então os registros são percorridos sequencialmente a partir
//! do offset 100 e o primeiro polígono válido encerra a busca.

use geo::{Coord, LineString, Polygon};
use tracing::debug;

use crate::header::{read_f64_le, read_i32_be, read_i32_le, ShapefileHeader, HEADER_LEN, SHAPE_TYPE_POLYGON};
use crate::ShapefileError;

/// Tamanho do header de cada registro (número + comprimento, big-endian)
const RECORD_HEADER_LEN: usize = 8;

/// Primeiro registro de polígono válido do stream
#[derive(Debug, Clone)]
pub struct PolygonRecord {
    /// Número do registro (1-based, como gravado no arquivo)
    pub record_number: i32,

    /// Anéis fechados: primeiro == último ponto em cada um
    pub rings: Vec<LineString<f64>>,
}

impl PolygonRecord {
    /// Total de pontos somando todos os anéis (após fechamento)
    pub fn point_count(&self) -> usize {
        self.rings.iter().map(|r| r.0.len()).sum()
    }

    /// Converte para `geo::Polygon`: primeiro anel é o exterior,
    /// os demais são interiores
    pub fn to_polygon(&self) -> Polygon<f64> {
        let exterior = self.rings[0].clone();
        let interiors = self.rings[1..].to_vec();
        Polygon::new(exterior, interiors)
    }
}

/// Percorre o stream a partir do offset 100 e retorna o primeiro
/// registro de polígono válido
///
/// Registros com tipo diferente de 5 (inclusive null shapes, tipo 0) ou
/// sem pontos são pulados. A varredura para no primeiro polígono, em
/// registro com número ou comprimento zero, ou ao alcançar o fim do
/// arquivo. Qualquer leitura que ultrapassaria o buffer aborta com
/// `CorruptRecord` em vez de retornar um resultado parcial.
pub fn first_polygon(
    data: &[u8],
    header: &ShapefileHeader,
) -> Result<PolygonRecord, ShapefileError> {
    let end = header.file_length.min(data.len());
    let mut offset = HEADER_LEN;

    while offset + RECORD_HEADER_LEN <= end {
        let record_number = read_i32_be(data, offset)?;
        let content_words = read_i32_be(data, offset + 4)?;
        if record_number < 0 || content_words < 0 {
            return Err(ShapefileError::corrupt(
                offset,
                format!(
                    "negative record header: number {}, length {} words",
                    record_number, content_words
                ),
            ));
        }
        let content_len = content_words as usize * 2;

        if record_number == 0 || content_len == 0 {
            break;
        }

        let body = offset + RECORD_HEADER_LEN;
        let shape_type = read_i32_le(data, body)?;

        if shape_type != SHAPE_TYPE_POLYGON {
            debug!(record_number, shape_type, "skipping non-polygon record");
            offset = body + content_len;
            continue;
        }

        match parse_polygon_body(data, body)? {
            Some(rings) => {
                debug!(record_number, rings = rings.len(), "polygon record decoded");
                return Ok(PolygonRecord {
                    record_number,
                    rings,
                });
            }
            // Polígono sem pontos: tolerado, segue a varredura
            None => {
                debug!(record_number, "skipping empty polygon record");
                offset = body + content_len;
            }
        }
    }

    Err(ShapefileError::NoValidFeature)
}

/// Decodifica o corpo de um registro de polígono a partir de `body`
/// (offset do tipo de geometria). Retorna `None` para registros sem
/// pontos.
fn parse_polygon_body(
    data: &[u8],
    body: usize,
) -> Result<Option<Vec<LineString<f64>>>, ShapefileError> {
    // Layout: tipo (4) + bbox (32) + numParts (4) + numPoints (4)
    let num_parts = read_i32_le(data, body + 36)?;
    let num_points = read_i32_le(data, body + 40)?;

    if num_parts < 0 || num_points < 0 {
        return Err(ShapefileError::corrupt(
            body + 36,
            format!("negative counts: {} parts, {} points", num_parts, num_points),
        ));
    }
    if num_points == 0 {
        return Ok(None);
    }
    if num_parts == 0 {
        return Err(ShapefileError::corrupt(
            body + 36,
            "polygon record with points but zero parts",
        ));
    }

    let num_parts = num_parts as usize;
    let num_points = num_points as usize;

    // Os contadores vêm do arquivo: antes de qualquer alocação, o corpo
    // declarado precisa caber no buffer
    let parts_start = body + 44;
    let declared_len = num_parts * 4 + num_points * 16;
    if parts_start + declared_len > data.len() {
        return Err(ShapefileError::corrupt(
            body + 36,
            format!(
                "declared {} parts and {} points exceed remaining {} bytes",
                num_parts,
                num_points,
                data.len().saturating_sub(parts_start)
            ),
        ));
    }

    let mut part_indices = Vec::with_capacity(num_parts);
    for i in 0..num_parts {
        let idx = read_i32_le(data, parts_start + i * 4)?;
        if idx < 0 || idx as usize > num_points {
            return Err(ShapefileError::corrupt(
                parts_start + i * 4,
                format!("part index {} out of range (0..{})", idx, num_points),
            ));
        }
        if let Some(prev) = part_indices.last() {
            if (idx as usize) < *prev {
                return Err(ShapefileError::corrupt(
                    parts_start + i * 4,
                    format!("part index {} decreases after {}", idx, prev),
                ));
            }
        }
        part_indices.push(idx as usize);
    }

    let points_start = parts_start + num_parts * 4;
    let mut points = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let off = points_start + i * 16;
        let x = read_f64_le(data, off)?;
        let y = read_f64_le(data, off + 8)?;
        points.push(Coord { x, y });
    }

    let mut rings = Vec::with_capacity(num_parts);
    for (ring, window) in part_indices.windows(2).enumerate() {
        rings.push(build_ring(ring, &points[window[0]..window[1]])?);
    }
    let last_start = part_indices[num_parts - 1];
    rings.push(build_ring(num_parts - 1, &points[last_start..])?);

    Ok(Some(rings))
}

/// Fecha um anel (repetindo o primeiro ponto se necessário) após
/// verificar o mínimo de 3 pontos
fn build_ring(ring: usize, points: &[Coord<f64>]) -> Result<LineString<f64>, ShapefileError> {
    if points.len() < 3 {
        return Err(ShapefileError::InvalidRing {
            ring,
            points: points.len(),
        });
    }

    let mut closed = points.to_vec();
    if closed.first() != closed.last() {
        closed.push(closed[0]);
    }
    Ok(LineString::from(closed))
}
