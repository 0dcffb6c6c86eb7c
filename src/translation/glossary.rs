/*!
 * Glossary post-correction.
 *
 * Terminology overrides applied to translated text before it reaches the
 * caller. Rules come from a JSON object of `term -> replacement` and are
 * applied in file order; each rule sees the output of the previous one, so a
 * replacement that contains a later rule's term is rewritten again.
 */

use std::path::Path;

use log::{info, warn};
use regex::{NoExpand, Regex, RegexBuilder};

use crate::errors::GlossaryError;

/// One term-for-term substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryRule {
    /// Text to look for, matched case-insensitively
    pub term: String,
    /// Text inserted in its place, verbatim
    pub replacement: String,
}

impl GlossaryRule {
    /// Create a new rule
    pub fn new(term: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            replacement: replacement.into(),
        }
    }
}

/// Compiled rule
#[derive(Debug)]
struct CompiledRule {
    rule: GlossaryRule,
    pattern: Regex,
}

/// Deterministic post-translation rewriter
#[derive(Debug, Default)]
pub struct GlossaryCorrector {
    rules: Vec<CompiledRule>,
}

impl GlossaryCorrector {
    /// A corrector that changes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a corrector from rules in application order
    pub fn from_rules(rules: Vec<GlossaryRule>) -> Result<Self, GlossaryError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                if rule.term.is_empty() {
                    return Err(GlossaryError::InvalidRule {
                        term: rule.term,
                        reason: "term is empty".to_string(),
                    });
                }
                let pattern = RegexBuilder::new(&regex::escape(&rule.term))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| GlossaryError::InvalidRule {
                        term: rule.term.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(CompiledRule { rule, pattern })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Parse rules from the JSON object text, keeping key order
    pub fn from_json(json: &str) -> Result<Self, GlossaryError> {
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(json).map_err(|e| GlossaryError::Parse(e.to_string()))?;

        let rules = map
            .into_iter()
            .map(|(term, value)| match value {
                serde_json::Value::String(replacement) => Ok(GlossaryRule { term, replacement }),
                other => Err(GlossaryError::InvalidRule {
                    term,
                    reason: format!("replacement must be a string, found {}", other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_rules(rules)
    }

    /// Load rules from a file, reporting every failure
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, GlossaryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GlossaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load rules from a file; a missing or broken file yields no rules
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "No glossary found at {:?}, translations will not be corrected",
                path
            );
            return Self::empty();
        }

        match Self::try_load(path) {
            Ok(glossary) => {
                info!("Glossary loaded: {} active rules", glossary.len());
                glossary
            }
            Err(e) => {
                warn!("Ignoring glossary: {}", e);
                Self::empty()
            }
        }
    }

    /// Apply every rule in order
    pub fn apply_post_correction(&self, text: &str) -> String {
        let mut corrected = text.to_string();
        for compiled in &self.rules {
            let replaced = compiled
                .pattern
                .replace_all(&corrected, NoExpand(&compiled.rule.replacement));
            corrected = replaced.into_owned();
        }
        corrected
    }

    /// Rules in application order
    pub fn rules(&self) -> impl Iterator<Item = &GlossaryRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
