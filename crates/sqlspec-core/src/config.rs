//! Immutable pipeline configuration. Never mutated in place — derived
//! configs are rebuilt from fields via `..` struct-update syntax.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use logging::warn;
use serde::{Deserialize, Serialize};

use crate::params::PlaceholderStyle;
use crate::processor::analyzers::StatementAnalyzer;
use crate::processor::transformers::{
    CommentRemover, ForceWhereClause, HintRemover, ParameterizeLiterals, TracingComment,
};
use crate::processor::validators::{
    CartesianProductDetector, ExcessiveJoins, InjectionDetector, PreventDDL, RiskyDml,
    SuspiciousKeywords, TautologyDetector,
};
use crate::processor::{Analyzer, Transformer, Validator};
use crate::statement::ProcessedState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CachePolicy {
    pub parse_cache_enabled: bool,
    pub parse_cache_size: usize,
    pub pipeline_cache_enabled: bool,
    pub pipeline_cache_size: usize,
    pub filter_cache_enabled: bool,
    pub filter_cache_size: usize,
    /// When true, a cache that fails to lock/initialize surfaces
    /// `CacheUnavailable` instead of silently falling back to uncached
    /// execution.
    pub required: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            parse_cache_enabled: true,
            parse_cache_size: 256,
            pipeline_cache_enabled: true,
            pipeline_cache_size: 256,
            filter_cache_enabled: true,
            filter_cache_size: 128,
            required: false,
        }
    }
}

/// Observability sink: invoked after every successful pipeline run. Its
/// own failures are caught and logged at `warn`, never propagated.
pub type ProcessedCallback = Arc<dyn Fn(&ProcessedState) + Send + Sync>;

#[derive(Clone)]
pub struct StatementConfig {
    pub parse_enabled: bool,
    pub transform_enabled: bool,
    pub validate_enabled: bool,
    pub analyze_enabled: bool,
    pub strict_mode: bool,
    pub allow_mixed_styles: bool,
    pub transformers: Vec<Arc<dyn Transformer>>,
    pub validators: Vec<Arc<dyn Validator>>,
    pub analyzers: Vec<Arc<dyn Analyzer>>,
    pub default_placeholder_style: PlaceholderStyle,
    pub cache_policy: CachePolicy,
    pub on_processed: Option<ProcessedCallback>,
}

impl std::fmt::Debug for StatementConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementConfig")
            .field("parse_enabled", &self.parse_enabled)
            .field("transform_enabled", &self.transform_enabled)
            .field("validate_enabled", &self.validate_enabled)
            .field("analyze_enabled", &self.analyze_enabled)
            .field("strict_mode", &self.strict_mode)
            .field("allow_mixed_styles", &self.allow_mixed_styles)
            .field("transformers", &self.transformers.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("validators", &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>())
            .field("analyzers", &self.analyzers.iter().map(|a| a.name()).collect::<Vec<_>>())
            .field("default_placeholder_style", &self.default_placeholder_style)
            .field("cache_policy", &self.cache_policy)
            .finish_non_exhaustive()
    }
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            parse_enabled: true,
            transform_enabled: true,
            validate_enabled: true,
            analyze_enabled: true,
            strict_mode: false,
            allow_mixed_styles: false,
            transformers: Vec::new(),
            validators: Vec::new(),
            analyzers: Vec::new(),
            default_placeholder_style: PlaceholderStyle::NumericDollar,
            cache_policy: CachePolicy::default(),
            on_processed: None,
        }
    }
}

impl StatementConfig {
    /// A config with every built-in processor wired in sensible order:
    /// comments/hints stripped, literals parameterized, then the full
    /// validator suite, then the structural analyzer. A ready-to-use
    /// baseline a caller customizes by rebuilding fields, never by
    /// mutating in place.
    #[must_use]
    pub fn with_builtin_defaults() -> Self {
        Self {
            transformers: vec![
                Arc::new(CommentRemover) as Arc<dyn Transformer>,
                Arc::new(HintRemover) as Arc<dyn Transformer>,
                Arc::new(ParameterizeLiterals::default()),
            ],
            validators: vec![
                Arc::new(InjectionDetector) as Arc<dyn Validator>,
                Arc::new(TautologyDetector) as Arc<dyn Validator>,
                Arc::new(PreventDDL::default()),
                Arc::new(RiskyDml),
                Arc::new(ExcessiveJoins::default()),
                Arc::new(CartesianProductDetector),
            ],
            analyzers: vec![Arc::new(StatementAnalyzer) as Arc<dyn Analyzer>],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn all_stages_disabled() -> Self {
        Self {
            parse_enabled: false,
            transform_enabled: false,
            validate_enabled: false,
            analyze_enabled: false,
            ..Self::default()
        }
    }

    /// Stable fingerprint over everything about this config that changes
    /// pipeline *output* (stage toggles, strict mode, processor chains in
    /// order, target style). Two configs with the same fingerprint
    /// produce the same `ProcessedState` for the same AST/params, which is
    /// exactly the property the pipeline cache key relies on.
    #[must_use]
    pub fn fingerprint(&self) -> crate::cache::Fingerprint {
        let flags = [
            u8::from(self.parse_enabled),
            u8::from(self.transform_enabled),
            u8::from(self.validate_enabled),
            u8::from(self.analyze_enabled),
            u8::from(self.strict_mode),
            u8::from(self.allow_mixed_styles),
        ];
        let transformers: Vec<u8> = self
            .transformers
            .iter()
            .flat_map(|t| t.name().as_bytes().iter().copied().chain([0u8]))
            .collect();
        let validators: Vec<u8> = self
            .validators
            .iter()
            .flat_map(|v| v.name().as_bytes().iter().copied().chain([0u8]))
            .collect();
        let analyzers: Vec<u8> = self
            .analyzers
            .iter()
            .flat_map(|a| a.name().as_bytes().iter().copied().chain([0u8]))
            .collect();
        let style = format!("{:?}", self.default_placeholder_style);
        crate::cache::Fingerprint::combine(&[
            &flags,
            &transformers,
            &validators,
            &analyzers,
            style.as_bytes(),
        ])
    }

    /// Loads a config from a TOML document, resolving its processor-name
    /// lists against the built-in registry.
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let parsed: StatementConfigToml = toml::from_str(toml_content)
            .map_err(|e| ConfigError::Parse(format!("failed to parse TOML: {e}")))?;
        parsed.resolve()
    }

    /// Reads and loads a config from a TOML file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("failed to read config file: {e}")))?;
        Self::from_toml(&content)
    }
}

/// TOML-serializable mirror of [`StatementConfig`]. Processor fields are
/// stored as built-in names rather than trait objects, since `Arc<dyn
/// Transformer>` has no `Deserialize` impl; [`resolve`](Self::resolve) maps
/// each name to its built-in instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementConfigToml {
    pub parse_enabled: bool,
    pub transform_enabled: bool,
    pub validate_enabled: bool,
    pub analyze_enabled: bool,
    pub strict_mode: bool,
    pub allow_mixed_styles: bool,
    pub transformers: Vec<String>,
    pub validators: Vec<String>,
    pub analyzers: Vec<String>,
    pub default_placeholder_style: PlaceholderStyle,
    pub cache_policy: CachePolicy,
}

impl Default for StatementConfigToml {
    fn default() -> Self {
        let base = StatementConfig::default();
        Self {
            parse_enabled: base.parse_enabled,
            transform_enabled: base.transform_enabled,
            validate_enabled: base.validate_enabled,
            analyze_enabled: base.analyze_enabled,
            strict_mode: base.strict_mode,
            allow_mixed_styles: base.allow_mixed_styles,
            transformers: Vec::new(),
            validators: Vec::new(),
            analyzers: Vec::new(),
            default_placeholder_style: base.default_placeholder_style,
            cache_policy: base.cache_policy,
        }
    }
}

impl StatementConfigToml {
    pub fn resolve(self) -> Result<StatementConfig, ConfigError> {
        let transformers = self
            .transformers
            .iter()
            .map(|name| resolve_transformer(name))
            .collect::<Result<Vec<_>, _>>()?;
        let validators = self
            .validators
            .iter()
            .map(|name| resolve_validator(name))
            .collect::<Result<Vec<_>, _>>()?;
        let analyzers = self
            .analyzers
            .iter()
            .map(|name| resolve_analyzer(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StatementConfig {
            parse_enabled: self.parse_enabled,
            transform_enabled: self.transform_enabled,
            validate_enabled: self.validate_enabled,
            analyze_enabled: self.analyze_enabled,
            strict_mode: self.strict_mode,
            allow_mixed_styles: self.allow_mixed_styles,
            transformers,
            validators,
            analyzers,
            default_placeholder_style: self.default_placeholder_style,
            cache_policy: self.cache_policy,
            on_processed: None,
        })
    }
}

fn resolve_transformer(name: &str) -> Result<Arc<dyn Transformer>, ConfigError> {
    Ok(match name {
        "CommentRemover" => Arc::new(CommentRemover) as Arc<dyn Transformer>,
        "HintRemover" => Arc::new(HintRemover),
        "ParameterizeLiterals" => Arc::new(ParameterizeLiterals::default()),
        "TracingComment" => Arc::new(TracingComment::new("config")),
        "ForceWhereClause" => Arc::new(ForceWhereClause),
        other => {
            warn!("unknown transformer name in config: {other}");
            return Err(ConfigError::UnknownProcessor(other.to_string()));
        }
    })
}

fn resolve_validator(name: &str) -> Result<Arc<dyn Validator>, ConfigError> {
    Ok(match name {
        "InjectionDetector" => Arc::new(InjectionDetector) as Arc<dyn Validator>,
        "TautologyDetector" => Arc::new(TautologyDetector),
        "PreventDDL" => Arc::new(PreventDDL::default()),
        "RiskyDml" => Arc::new(RiskyDml),
        "SuspiciousKeywords" => Arc::new(SuspiciousKeywords::default()),
        "ExcessiveJoins" => Arc::new(ExcessiveJoins::default()),
        "CartesianProductDetector" => Arc::new(CartesianProductDetector::default()),
        other => {
            warn!("unknown validator name in config: {other}");
            return Err(ConfigError::UnknownProcessor(other.to_string()));
        }
    })
}

fn resolve_analyzer(name: &str) -> Result<Arc<dyn Analyzer>, ConfigError> {
    Ok(match name {
        "StatementAnalyzer" => Arc::new(StatementAnalyzer) as Arc<dyn Analyzer>,
        other => {
            warn!("unknown analyzer name in config: {other}");
            return Err(ConfigError::UnknownProcessor(other.to_string()));
        }
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("unknown processor name: {0}")]
    UnknownProcessor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_round_trips_to_builtin_defaults_shape() {
        let cfg = StatementConfigToml::default().resolve().unwrap();
        assert!(cfg.parse_enabled);
        assert!(cfg.transformers.is_empty());
    }

    #[test]
    fn named_processors_resolve_to_builtins() {
        let toml_content = r#"
            transformers = ["CommentRemover", "ParameterizeLiterals"]
            validators = ["InjectionDetector", "TautologyDetector"]
            analyzers = ["StatementAnalyzer"]
        "#;
        let cfg = StatementConfig::from_toml(toml_content).unwrap();
        assert_eq!(cfg.transformers.len(), 2);
        assert_eq!(cfg.validators.len(), 2);
        assert_eq!(cfg.analyzers.len(), 1);
        assert_eq!(cfg.transformers[0].name(), "CommentRemover");
    }

    #[test]
    fn unknown_processor_name_is_rejected() {
        let toml_content = r#"transformers = ["NotARealTransformer"]"#;
        let err = StatementConfig::from_toml(toml_content).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProcessor(_)));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = StatementConfig::from_toml("not valid toml =").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
