//! Decodificação do header do arquivo .shp
//!
//! Layout fixo de 100 bytes: magic 9994 big-endian no offset 0,
//! comprimento do arquivo (em words de 16 bits) big-endian no offset 24,
//! versão e tipo de geometria little-endian nos offsets 28/32, bounding
//! box em float64 little-endian a partir do offset 36.

use crate::ShapefileError;

/// Magic number de todo arquivo .shp
pub const FILE_CODE: i32 = 9994;

/// Código do tipo polígono
pub const SHAPE_TYPE_POLYGON: i32 = 5;

/// Tamanho do header em bytes
pub const HEADER_LEN: usize = 100;

/// Header decodificado do stream .shp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapefileHeader {
    /// Magic number (sempre 9994 após validação)
    pub file_code: i32,

    /// Comprimento do arquivo em bytes (o valor em disco é em words de
    /// 16 bits; aqui já convertido)
    pub file_length: usize,

    /// Versão do formato (1000)
    pub version: i32,

    /// Tipo de geometria (sempre 5 após validação)
    pub shape_type: i32,

    /// Bounding box global: (xmin, ymin, xmax, ymax)
    pub bbox: (f64, f64, f64, f64),
}

impl ShapefileHeader {
    /// Decodifica e valida o header a partir do buffer completo do .shp
    ///
    /// Nunca retorna um header parcial: buffer curto, magic errado ou
    /// tipo de geometria não suportado são erros distintos.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ShapefileError> {
        if data.len() < HEADER_LEN {
            return Err(ShapefileError::Undersized { len: data.len() });
        }

        let file_code = read_i32_be(data, 0)?;
        if file_code != FILE_CODE {
            return Err(ShapefileError::BadFileCode { found: file_code });
        }

        let length_words = read_i32_be(data, 24)?;
        if length_words < 0 {
            return Err(ShapefileError::corrupt(
                24,
                format!("negative file length: {} words", length_words),
            ));
        }
        let file_length = length_words as usize * 2;
        let version = read_i32_le(data, 28)?;

        let shape_type = read_i32_le(data, 32)?;
        if shape_type != SHAPE_TYPE_POLYGON {
            return Err(ShapefileError::UnsupportedShapeType { found: shape_type });
        }

        let bbox = (
            read_f64_le(data, 36)?,
            read_f64_le(data, 44)?,
            read_f64_le(data, 52)?,
            read_f64_le(data, 60)?,
        );

        Ok(Self {
            file_code,
            file_length,
            version,
            shape_type,
            bbox,
        })
    }
}

/// Lê um i32 big-endian com verificação de limites
pub(crate) fn read_i32_be(data: &[u8], offset: usize) -> Result<i32, ShapefileError> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or_else(|| ShapefileError::corrupt(offset, "i32 read past end of buffer"))?;
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Lê um i32 little-endian com verificação de limites
pub(crate) fn read_i32_le(data: &[u8], offset: usize) -> Result<i32, ShapefileError> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or_else(|| ShapefileError::corrupt(offset, "i32 read past end of buffer"))?;
    Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Lê um f64 little-endian com verificação de limites
pub(crate) fn read_f64_le(data: &[u8], offset: usize) -> Result<f64, ShapefileError> {
    let bytes = data
        .get(offset..offset + 8)
        .ok_or_else(|| ShapefileError::corrupt(offset, "f64 read past end of buffer"))?;
    Ok(f64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}
