//! Cliente da calculadora de compensação ambiental
//!
//! Conduz o pipeline completo: decodificação do shapefile enviado,
//! resolução da referência espacial, reprojeção para SIRGAS 2000,
//! submissão à task de geoprocessamento, polling até a conclusão e
//! classificação do relatório de suficiência.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gp;
pub mod report;
pub mod reproject;

pub use config::Config;
pub use error::AnalysisError;
pub use gp::Analyzer;
pub use report::AnalysisOutcome;
