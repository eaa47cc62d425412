//! Comandos da linha de comando

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::{info, warn};

use crate::auth::PortalIdentity;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::gp::client::HttpGpService;
use crate::gp::params::AnalysisInput;
use crate::gp::Analyzer;
use crate::reproject::Reprojector;

#[derive(Subcommand)]
pub enum Commands {
    /// Submete um shapefile à análise de compensação
    Analisar {
        /// Caminho do arquivo ZIP com o shapefile
        zip: PathBuf,

        /// Valores IDEA (repetível, de 1 a 10)
        #[arg(long = "idea", required = true)]
        idea: Vec<String>,

        /// Arquivo de configuração JSON (padrão: variáveis de ambiente)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Valida um arquivo ZIP sem submeter
    Validar {
        /// Caminho do arquivo ZIP com o shapefile
        zip: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::from_env(),
    }
}

/// Comando `analisar`: pipeline completo até o desfecho
pub async fn cmd_analisar(zip: &Path, idea: Vec<String>, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let bytes = std::fs::read(zip)
        .context(format!("Falha ao ler o arquivo: {}", zip.display()))?;

    let decoded = shapefile::decode_zip(&bytes).map_err(AnalysisError::from_shapefile)?;
    info!("{}", decoded.summary());

    // Reprojeção para o WKID alvo; em falha, segue com a geometria
    // original em modo degradado
    let mut polygon = decoded.polygon();
    let mut reference = decoded.spatial_reference;
    if reference.wkid != config.target_wkid {
        match Reprojector::new(reference.wkid, config.target_wkid) {
            Ok(reproj) => {
                if !reproj.is_identity() {
                    polygon = reproj.transform_polygon(&polygon);
                }
                reference = shapefile::SpatialReference::new(config.target_wkid);
                info!(wkid = config.target_wkid, "geometry reprojected");
            }
            Err(err) => {
                warn!("reprojection unavailable, submitting unprojected geometry: {}", err);
            }
        }
    }

    let input = AnalysisInput {
        shapefile_geometry: Some((polygon, reference)),
        sketch_geometry: None,
        idea_values: idea,
    };

    let service = HttpGpService::new(&config.service_url, &config.task_name)?;
    let mut analyzer = Analyzer::new(config, service, PortalIdentity::new());
    let outcome = analyzer.analyze(&input).await?;

    if outcome.message.is_empty() {
        println!("Análise concluída, sem classificação derivável do relatório.");
    } else {
        println!("{}", outcome.message);
    }
    match &outcome.report_url {
        Some(url) => println!("Relatório: {}", url),
        None => println!("Relatório não disponível."),
    }

    Ok(())
}

/// Comando `validar`: apenas a checagem de pré-envio
pub fn cmd_validar(zip: &Path) -> Result<()> {
    let bytes = std::fs::read(zip)
        .context(format!("Falha ao ler o arquivo: {}", zip.display()))?;

    let validation = shapefile::validate_zip(&bytes);
    println!("{}", validation.message);
    println!("Entradas no ZIP: {}", validation.file_count);

    if !validation.valid {
        bail!("shapefile inválido");
    }
    Ok(())
}
