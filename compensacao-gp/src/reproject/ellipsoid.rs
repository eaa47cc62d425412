//! Parâmetros dos elipsoides de referência

/// Elipsoide de referência (semi-eixo maior e excentricidades)
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    /// Semi-eixo maior (raio equatorial) em metros
    pub a: f64,

    /// Primeira excentricidade ao quadrado
    pub e2: f64,

    /// Segunda excentricidade ao quadrado
    pub ep2: f64,
}

const fn from_flattening(a: f64, f: f64) -> Ellipsoid {
    let e2 = 2.0 * f - f * f;
    Ellipsoid {
        a,
        e2,
        ep2: e2 / (1.0 - e2),
    }
}

/// WGS84, usado pelas zonas UTM 326xx/327xx
pub const WGS84: Ellipsoid = from_flattening(6_378_137.0, 1.0 / 298.257223563);

/// GRS80, elipsoide do SIRGAS 2000 (zonas 3197x/3198x)
/// Diferença para o WGS84 inferior a 0,1 mm
pub const GRS80: Ellipsoid = from_flattening(6_378_137.0, 1.0 / 298.257222101);
