//! Definition loader: reads a survey definition file into a structured tree.
//!
//! Parsers are looked up by file extension in a [`DefinitionFormats`]
//! registry, so adding a format never touches the survey core.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::SurveyError;
use crate::survey::Survey;

pub type ParseFn = fn(&str) -> Result<Value, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown definition format for {} (expected one of: {expected})", .path.display())]
    UnknownFormat { path: PathBuf, expected: String },
    #[error("failed to parse {format} definition: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error(transparent)]
    Definition(#[from] SurveyError),
}

pub struct DefinitionFormats {
    parsers: HashMap<String, ParseFn>,
}

impl Default for DefinitionFormats {
    fn default() -> Self {
        let mut parsers: HashMap<String, ParseFn> = HashMap::new();
        parsers.insert("json".to_string(), parse_json);
        parsers.insert("yaml".to_string(), parse_yaml);
        parsers.insert("yml".to_string(), parse_yaml);
        Self { parsers }
    }
}

impl DefinitionFormats {
    pub fn extensions(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.parsers.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn insert(&mut self, extension: impl Into<String>, parser: ParseFn) {
        self.parsers
            .insert(extension.into().to_ascii_lowercase(), parser);
    }

    pub fn resolve(&self, path: &Path) -> Result<ParseFn, LoadError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.parsers.get(&ext.to_ascii_lowercase()))
            .copied()
            .ok_or_else(|| LoadError::UnknownFormat {
                path: path.to_path_buf(),
                expected: self.extensions().join(", "),
            })
    }

    /// Read and parse a definition file into a structured tree.
    pub fn load(&self, path: &Path) -> Result<Value, LoadError> {
        let parse = self.resolve(path)?;
        debug!(path = %path.display(), "loading survey definition");
        let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&raw)
    }

    /// Load a definition file and build the survey from it.
    pub fn load_survey(&self, path: &Path) -> Result<Survey, LoadError> {
        let definition = self.load(path)?;
        let survey = Survey::from_definition(&definition)?;
        info!(
            title = %survey.title,
            questions = survey.len(),
            connections = survey.connection_count(),
            "survey loaded"
        );
        Ok(survey)
    }
}

/// Load a survey with the default format registry.
pub fn load_survey(path: impl AsRef<Path>) -> Result<Survey, LoadError> {
    DefinitionFormats::default().load_survey(path.as_ref())
}

fn parse_json(raw: &str) -> Result<Value, LoadError> {
    serde_json::from_str(raw).map_err(|e| LoadError::Parse {
        format: "json",
        message: e.to_string(),
    })
}

fn parse_yaml(raw: &str) -> Result<Value, LoadError> {
    serde_yaml::from_str(raw).map_err(|e| LoadError::Parse {
        format: "yaml",
        message: e.to_string(),
    })
}
