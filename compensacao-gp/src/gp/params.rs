//! Montagem dos parâmetros de submissão
//!
//! A geometria viaja como um `GPFeatureRecordSetLayer` da Esri, sempre
//! carregando a referência espacial realmente associada a ela (nunca o
//! padrão do processo de forma silenciosa). Quando há geometria, a
//! submissão usa multipart para que a string JSON não seja corrompida
//! pelo form-encoding.

use geo::Polygon;
use serde::Serialize;
use serde_json::{json, Value};
use shapefile::SpatialReference;

use crate::error::AnalysisError;

/// Máximo de valores IDEA aceitos por submissão
pub const MAX_IDEA_VALUES: usize = 10;

/// Entrada da análise: exatamente uma das geometrias deve estar presente
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    /// Geometria extraída de um shapefile enviado
    pub shapefile_geometry: Option<(Polygon<f64>, SpatialReference)>,

    /// Geometria desenhada à mão (colaborador externo de sketch)
    pub sketch_geometry: Option<(Polygon<f64>, SpatialReference)>,

    /// Valores IDEA (1 a 10, todos não vazios)
    pub idea_values: Vec<String>,
}

impl AnalysisInput {
    /// Seleciona a geometria da submissão, exigindo exatamente uma fonte
    pub fn geometry(&self) -> Result<(&Polygon<f64>, SpatialReference), AnalysisError> {
        match (&self.shapefile_geometry, &self.sketch_geometry) {
            (Some((polygon, reference)), None) | (None, Some((polygon, reference))) => {
                Ok((polygon, *reference))
            }
            (Some(_), Some(_)) => Err(AnalysisError::Validation(
                "Selecione apenas uma fonte de geometria: shapefile ou desenho.".to_string(),
            )),
            (None, None) => Err(AnalysisError::Validation(
                "Nenhuma geometria informada: envie um shapefile ou desenhe a área.".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpatialReferenceJson {
    wkid: i32,
    latest_wkid: i32,
}

impl From<SpatialReference> for SpatialReferenceJson {
    fn from(reference: SpatialReference) -> Self {
        Self {
            wkid: reference.wkid,
            latest_wkid: reference.latest_wkid.unwrap_or(reference.wkid),
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldDescriptor {
    name: &'static str,
    #[serde(rename = "type")]
    field_type: &'static str,
    alias: &'static str,
}

/// Envelope `GPFeatureRecordSetLayer` com uma única feature
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRecordSetLayer {
    display_field_name: &'static str,
    geometry_type: &'static str,
    spatial_reference: SpatialReferenceJson,
    fields: Vec<FieldDescriptor>,
    features: Vec<Value>,
    exceeded_transfer_limit: bool,
}

impl FeatureRecordSetLayer {
    /// Serializa o polígono como feature única; os anéis são revalidados
    /// (mínimo de 4 pontos, fechados) neste ponto
    pub fn from_polygon(
        polygon: &Polygon<f64>,
        reference: SpatialReference,
    ) -> Result<Self, AnalysisError> {
        let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
        rings.push(ring_coordinates(polygon.exterior())?);
        for interior in polygon.interiors() {
            rings.push(ring_coordinates(interior)?);
        }

        let spatial_reference = SpatialReferenceJson::from(reference);
        let feature = json!({
            "geometry": {
                "rings": rings,
                "spatialReference": {
                    "wkid": spatial_reference.wkid,
                    "latestWkid": spatial_reference.latest_wkid,
                },
            },
            "attributes": {
                "OBJECTID": 1,
            },
        });

        Ok(Self {
            display_field_name: "OBJECTID",
            geometry_type: "esriGeometryPolygon",
            spatial_reference,
            fields: vec![
                FieldDescriptor {
                    name: "OBJECTID",
                    field_type: "esriFieldTypeOID",
                    alias: "OBJECTID",
                },
                FieldDescriptor {
                    name: "Shape_Length",
                    field_type: "esriFieldTypeDouble",
                    alias: "Shape_Length",
                },
                FieldDescriptor {
                    name: "Shape_Area",
                    field_type: "esriFieldTypeDouble",
                    alias: "Shape_Area",
                },
            ],
            features: vec![feature],
            exceeded_transfer_limit: false,
        })
    }
}

fn ring_coordinates(ring: &geo::LineString<f64>) -> Result<Vec<[f64; 2]>, AnalysisError> {
    let coords: Vec<[f64; 2]> = ring.coords().map(|c| [c.x, c.y]).collect();
    if coords.len() < 4 || coords.first() != coords.last() {
        return Err(AnalysisError::Validation(
            "A geometria contém um anel aberto ou com menos de 4 pontos.".to_string(),
        ));
    }
    Ok(coords)
}

/// Payload de submissão pronto para o cliente HTTP
#[derive(Debug, Clone)]
pub struct Submission {
    /// Pares nome/valor dos parâmetros da task
    pub fields: Vec<(String, String)>,

    /// Indica que o payload carrega geometria serializada
    /// (decide multipart vs form-encoding)
    pub has_geometry: bool,
}

/// Monta a submissão a partir da entrada validada
///
/// Pré-condições verificadas antes de qualquer chamada de rede:
/// exatamente uma geometria, 1 a 10 valores IDEA não vazios.
pub fn build_submission(input: &AnalysisInput) -> Result<Submission, AnalysisError> {
    let (polygon, reference) = input.geometry()?;

    if input.idea_values.is_empty() || input.idea_values.len() > MAX_IDEA_VALUES {
        return Err(AnalysisError::Validation(format!(
            "Informe de 1 a {} valores IDEA ({} recebidos).",
            MAX_IDEA_VALUES,
            input.idea_values.len()
        )));
    }
    if input.idea_values.iter().any(|v| v.trim().is_empty()) {
        return Err(AnalysisError::Validation(
            "Valores IDEA não podem ser vazios.".to_string(),
        ));
    }

    let layer = FeatureRecordSetLayer::from_polygon(polygon, reference)?;
    let layer_json = serde_json::to_string(&layer)
        .map_err(|e| AnalysisError::Validation(format!("Falha ao serializar geometria: {}", e)))?;

    let mut fields = vec![("area_proposta".to_string(), layer_json)];
    fields.push((
        "quantidade_idea".to_string(),
        input.idea_values.len().to_string(),
    ));
    for (i, value) in input.idea_values.iter().enumerate() {
        fields.push((format!("idea_{}", i + 1), value.clone()));
    }

    Ok(Submission {
        fields,
        has_geometry: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString};

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        )
    }

    fn input_with_shapefile() -> AnalysisInput {
        AnalysisInput {
            shapefile_geometry: Some((square(), SpatialReference::new(4674))),
            sketch_geometry: None,
            idea_values: vec!["IDEA-001".to_string()],
        }
    }

    #[test]
    fn test_both_geometries_rejected_before_network() {
        let mut input = input_with_shapefile();
        input.sketch_geometry = Some((square(), SpatialReference::new(4674)));

        assert!(matches!(
            build_submission(&input),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_neither_geometry_rejected() {
        let input = AnalysisInput {
            idea_values: vec!["IDEA-001".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            build_submission(&input),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_feature_set_envelope() {
        let layer =
            FeatureRecordSetLayer::from_polygon(&square(), SpatialReference::new(31983)).unwrap();
        let value = serde_json::to_value(&layer).unwrap();

        assert_eq!(value["geometryType"], "esriGeometryPolygon");
        assert_eq!(value["spatialReference"]["wkid"], 31983);
        assert_eq!(value["spatialReference"]["latestWkid"], 31983);
        assert_eq!(value["exceededTransferLimit"], false);
        assert_eq!(value["features"].as_array().unwrap().len(), 1);
        assert_eq!(
            value["features"][0]["geometry"]["spatialReference"]["wkid"],
            31983
        );
        assert_eq!(value["fields"][0]["type"], "esriFieldTypeOID");
    }

    #[test]
    fn test_degenerate_ring_rejected_at_serialization() {
        // Duas posições viram um anel fechado de 3 pontos após o
        // fechamento do construtor, abaixo do mínimo de 4
        let degenerate = Polygon::new(
            LineString::from(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }]),
            vec![],
        );
        assert!(matches!(
            FeatureRecordSetLayer::from_polygon(&degenerate, SpatialReference::new(4674)),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_scalar_parameters() {
        let mut input = input_with_shapefile();
        input.idea_values = vec!["A".to_string(), "B".to_string()];

        let submission = build_submission(&input).unwrap();
        assert!(submission.has_geometry);

        let find = |name: &str| {
            submission
                .fields
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(find("quantidade_idea").unwrap(), "2");
        assert_eq!(find("idea_1").unwrap(), "A");
        assert_eq!(find("idea_2").unwrap(), "B");
        assert!(find("area_proposta").unwrap().contains("esriGeometryPolygon"));
    }

    #[test]
    fn test_idea_bounds() {
        let mut input = input_with_shapefile();
        input.idea_values = vec![];
        assert!(build_submission(&input).is_err());

        input.idea_values = vec!["x".to_string(); 11];
        assert!(build_submission(&input).is_err());

        input.idea_values = vec![" ".to_string()];
        assert!(build_submission(&input).is_err());
    }
}
