//! Reprojeção leve em Rust puro para as referências usuais do Brasil
//!
//! Fontes suportadas:
//! - SIRGAS 2000 geográfico (EPSG:4674) e WGS84 (EPSG:4326)
//! - Web Mercator (EPSG:3857)
//! - SIRGAS 2000 / UTM sul, zonas 17S a 25S (EPSG:31977 a 31985)
//! - WGS84 / UTM (EPSG:32601–32660 norte, 32701–32760 sul)
//!
//! Destinos: SIRGAS 2000 (4674), WGS84 (4326) e Web Mercator (3857).
//! SIRGAS 2000 e WGS84 são tratados como coincidentes nesta precisão.

mod ellipsoid;
mod mercator;
mod utm;

use anyhow::{bail, Result};
use geo::{Coord, LineString, Polygon};

use ellipsoid::{GRS80, WGS84};

/// Ponto em coordenadas geográficas (radianos)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    pub lon: f64,
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Reprojetor entre um WKID de origem e um de destino
pub struct Reprojector {
    source_wkid: i32,
    target_wkid: i32,
}

impl Reprojector {
    pub fn new(source_wkid: i32, target_wkid: i32) -> Result<Self> {
        if !Self::is_supported_source(source_wkid) {
            bail!(
                "WKID {} não suportado como origem. Suportados: 4674, 4326, 3857, 31977-31985, 32601-32660, 32701-32760",
                source_wkid
            );
        }
        if !Self::is_supported_target(target_wkid) {
            bail!(
                "WKID {} não suportado como destino. Suportados: 4674, 4326, 3857",
                target_wkid
            );
        }

        Ok(Self {
            source_wkid,
            target_wkid,
        })
    }

    pub fn is_supported_source(wkid: i32) -> bool {
        matches!(wkid, 4674 | 4326 | 3857)
            || (31977..=31985).contains(&wkid)
            || (32601..=32660).contains(&wkid)
            || (32701..=32760).contains(&wkid)
    }

    pub fn is_supported_target(wkid: i32) -> bool {
        matches!(wkid, 4674 | 4326 | 3857)
    }

    /// Origem e destino coincidem (nenhuma transformação necessária);
    /// 4674 e 4326 contam como o mesmo sistema nesta precisão
    pub fn is_identity(&self) -> bool {
        let geographic = |w: i32| matches!(w, 4674 | 4326);
        self.source_wkid == self.target_wkid
            || (geographic(self.source_wkid) && geographic(self.target_wkid))
    }

    /// Transforma um ponto (x, y) da origem para o destino
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let geo = self.source_to_geographic(x, y);
        self.geographic_to_target(geo)
    }

    fn source_to_geographic(&self, x: f64, y: f64) -> Geographic {
        match self.source_wkid {
            4674 | 4326 => Geographic::from_degrees(x, y),
            3857 => mercator::web_mercator_to_geographic(x, y),
            w @ 31977..=31985 => {
                utm::utm_to_geographic(x, y, (w - 31960) as u32, true, &GRS80)
            }
            w @ 32601..=32660 => {
                utm::utm_to_geographic(x, y, (w - 32600) as u32, false, &WGS84)
            }
            w @ 32701..=32760 => {
                utm::utm_to_geographic(x, y, (w - 32700) as u32, true, &WGS84)
            }
            // Inalcançável: o construtor rejeita origens não suportadas
            _ => Geographic::from_degrees(x, y),
        }
    }

    fn geographic_to_target(&self, geo: Geographic) -> (f64, f64) {
        match self.target_wkid {
            3857 => mercator::geographic_to_web_mercator(geo),
            _ => geo.to_degrees(),
        }
    }

    /// Transforma um polígono, anel por anel
    pub fn transform_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        let transform_ring = |ring: &LineString<f64>| {
            LineString::new(
                ring.coords()
                    .map(|c| {
                        let (x, y) = self.transform_point(c.x, c.y);
                        Coord { x, y }
                    })
                    .collect(),
            )
        };

        Polygon::new(
            transform_ring(polygon.exterior()),
            polygon.interiors().iter().map(transform_ring).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_23s_to_sirgas() {
        let reproj = Reprojector::new(31983, 4674).unwrap();
        let (lon, lat) = reproj.transform_point(500_000.0, 8_000_000.0);

        assert!((lon - (-45.0)).abs() < 0.01, "lon={}", lon);
        assert!((lat - (-18.09)).abs() < 0.3, "lat={}", lat);
    }

    #[test]
    fn test_web_mercator_to_sirgas() {
        let reproj = Reprojector::new(3857, 4674).unwrap();
        let (lon, lat) = reproj.transform_point(-5_009_377.0, 0.0);

        assert!((lon - (-45.0)).abs() < 0.01, "lon={}", lon);
        assert!(lat.abs() < 0.01, "lat={}", lat);
    }

    #[test]
    fn test_geographic_pair_is_identity() {
        assert!(Reprojector::new(4326, 4674).unwrap().is_identity());
        assert!(Reprojector::new(4674, 4674).unwrap().is_identity());
        assert!(!Reprojector::new(31983, 4674).unwrap().is_identity());
    }

    #[test]
    fn test_unsupported_wkid() {
        // Córrego Alegre (datum antigo): fora do suporte
        assert!(Reprojector::new(22523, 4674).is_err());
        assert!(Reprojector::new(31983, 31983).is_err());
    }

    #[test]
    fn test_transform_polygon_preserves_rings() {
        use geo::{Coord, LineString};

        let polygon = Polygon::new(
            LineString::from(vec![
                Coord { x: 500_000.0, y: 8_000_000.0 },
                Coord { x: 501_000.0, y: 8_000_000.0 },
                Coord { x: 501_000.0, y: 8_001_000.0 },
                Coord { x: 500_000.0, y: 8_000_000.0 },
            ]),
            vec![],
        );

        let reproj = Reprojector::new(31983, 4674).unwrap();
        let projected = reproj.transform_polygon(&polygon);

        assert_eq!(projected.exterior().0.len(), 4);
        // Fechamento preservado
        assert_eq!(projected.exterior().0.first(), projected.exterior().0.last());
        // Graus plausíveis para o centro-sul do Brasil
        for coord in projected.exterior().coords() {
            assert!(coord.x < -40.0 && coord.x > -50.0);
            assert!(coord.y < -15.0 && coord.y > -20.0);
        }
    }
}
