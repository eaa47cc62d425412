//! Teste de ponta a ponta: ZIP sintético → geometria + referência

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use shapefile::{decode_zip, validate_zip, ShapefileError};

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut cursor);
        for (name, data) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// Stream .shp com um único registro de polígono de um anel
fn build_shp(ring: &[(f64, f64)]) -> Vec<u8> {
    let mut buf = vec![0u8; 100];
    buf[0..4].copy_from_slice(&9994i32.to_be_bytes());
    buf[28..32].copy_from_slice(&1000i32.to_le_bytes());
    buf[32..36].copy_from_slice(&5i32.to_le_bytes());

    let mut body = Vec::new();
    body.extend_from_slice(&5i32.to_le_bytes());
    body.extend_from_slice(&[0u8; 32]);
    body.extend_from_slice(&1i32.to_le_bytes());
    body.extend_from_slice(&(ring.len() as i32).to_le_bytes());
    body.extend_from_slice(&0i32.to_le_bytes());
    for (x, y) in ring {
        body.extend_from_slice(&x.to_le_bytes());
        body.extend_from_slice(&y.to_le_bytes());
    }

    buf.extend_from_slice(&1i32.to_be_bytes());
    buf.extend_from_slice(&((body.len() / 2) as i32).to_be_bytes());
    buf.extend_from_slice(&body);

    let total = buf.len();
    buf[24..28].copy_from_slice(&((total / 2) as i32).to_be_bytes());
    buf
}

const UTM_23S_WKT: &[u8] =
    br#"PROJCS["SIRGAS_2000_UTM_Zone_23S",GEOGCS["GCS_SIRGAS_2000"],PROJECTION["Transverse_Mercator"]]"#;

#[test]
fn decode_zip_end_to_end() {
    let shp = build_shp(&[
        (200_000.0, 7_500_000.0),
        (201_000.0, 7_500_000.0),
        (201_000.0, 7_501_000.0),
        (200_000.0, 7_500_000.0),
    ]);
    let bytes = build_zip(&[
        ("area.shp", &shp),
        ("area.shx", b"idx"),
        ("area.dbf", b"attrs"),
        ("area.prj", UTM_23S_WKT),
    ]);

    let decoded = decode_zip(&bytes).unwrap();
    assert_eq!(decoded.record.rings.len(), 1);
    assert_eq!(decoded.record.rings[0].0.len(), 4);
    // O WKT é SIRGAS 2000, regra de maior prioridade
    assert_eq!(decoded.spatial_reference.wkid, 4674);

    let polygon = decoded.polygon();
    assert_eq!(polygon.exterior().0.len(), 4);
}

#[test]
fn decode_zip_without_prj_uses_default() {
    let shp = build_shp(&[(0.0, 0.0), (1.0, 0.0), (0.5, 1.0)]);
    let bytes = build_zip(&[
        ("area.shp", &shp),
        ("area.shx", b""),
        ("area.dbf", b""),
    ]);

    let decoded = decode_zip(&bytes).unwrap();
    assert_eq!(decoded.spatial_reference.wkid, 4674);
}

#[test]
fn decode_zip_missing_entries() {
    let bytes = build_zip(&[("area.shp", b"too small")]);

    match decode_zip(&bytes) {
        Err(ShapefileError::MissingFiles { missing, .. }) => {
            assert_eq!(missing, vec![".shx", ".dbf"]);
        }
        other => panic!("Expected MissingFiles, got {:?}", other),
    }
}

#[test]
fn validate_zip_reports_user_messages() {
    // ZIP incompleto
    let bytes = build_zip(&[("area.shp", b"x"), ("area.shx", b""), ("area.dbf", b"")]);
    let validation = validate_zip(&bytes);
    assert!(!validation.valid);
    assert!(validation.message.contains("100 bytes"));

    // ZIP válido
    let shp = build_shp(&[(0.0, 0.0), (1.0, 0.0), (0.5, 1.0)]);
    let bytes = build_zip(&[
        ("area.shp", &shp),
        ("area.shx", b""),
        ("area.dbf", b""),
    ]);
    let validation = validate_zip(&bytes);
    assert!(validation.valid);
    assert_eq!(validation.file_count, 3);
}

#[test]
fn validate_zip_names_missing_files() {
    let bytes = build_zip(&[("area.shp", b"x")]);
    let validation = validate_zip(&bytes);
    assert!(!validation.valid);
    assert!(validation.message.contains(".shx"));
    assert!(validation.message.contains(".dbf"));
    assert!(validation.message.contains("shapefile completo"));
}
