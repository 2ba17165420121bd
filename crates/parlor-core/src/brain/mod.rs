//! Brain: a small AIML-subset pattern engine (the dialogue engine).
//!
//! Categories are compiled into a [`graph::Graph`] once, at bootstrap; the graph
//! is read-only afterwards. Per-session predicates live in a [`DashMap`] so the
//! brain can be shared behind an `Arc` by concurrent front ends.
//!
//! Supported template elements: text, `<star/>`, `<get/>`, `<set>`, `<think>`,
//! `<srai>`, `<sr/>`, `<uppercase>`, `<lowercase>`.

mod graph;
mod loader;
mod template;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::dialogue::DialogueEngine;
use graph::Graph;
use template::TemplateNode;

/// Bumped whenever the serialized graph layout changes.
const CACHE_FORMAT_VERSION: u32 = 1;

/// Maximum `<srai>` nesting before a branch renders empty.
const MAX_SRAI_DEPTH: usize = 8;

/// File extensions read from the rule-source directory.
const RULE_EXTENSIONS: [&str; 2] = ["aiml", "xml"];

#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed rule file: {0}")]
    Parse(String),
    #[error("no usable rule files (*.aiml, *.xml) in {}", .0.display())]
    NoRuleFiles(PathBuf),
    #[error("brain cache is unreadable: {0}")]
    Cache(String),
    #[error("brain cache format {found} is not supported (expected {expected})")]
    CacheVersion { found: u32, expected: u32 },
}

#[derive(Serialize, Deserialize)]
struct BrainImage {
    format_version: u32,
    graph: Graph,
}

/// Compiled knowledge base plus the session predicate store.
#[derive(Debug, Default)]
pub struct Brain {
    graph: Graph,
    /// session id -> (predicate name -> value)
    predicates: DashMap<String, HashMap<String, String>>,
}

impl Brain {
    /// An empty brain (no categories).
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every `*.aiml` / `*.xml` file in `dir`, in sorted path order.
    ///
    /// Unreadable or malformed files are logged and skipped; the directory
    /// only counts as empty when no file contributes a category.
    pub fn compile_dir<P: AsRef<Path>>(dir: P) -> Result<Self, BrainError> {
        let dir = dir.as_ref();
        let files = rule_files(dir)?;

        let mut brain = Self::new();
        for file in &files {
            let learned = match std::fs::read_to_string(file)
                .map_err(|source| BrainError::Io {
                    path: file.clone(),
                    source,
                })
                .and_then(|source| brain.learn_str(&source))
            {
                Ok(learned) => learned,
                Err(e) => {
                    tracing::warn!(
                        target: "parlor::brain",
                        file = %file.display(),
                        error = %e,
                        "Skipping rule file"
                    );
                    continue;
                }
            };
            tracing::debug!(
                target: "parlor::brain",
                file = %file.display(),
                categories = learned,
                "Learned rule file"
            );
        }
        if brain.category_count() == 0 {
            return Err(BrainError::NoRuleFiles(dir.to_path_buf()));
        }
        tracing::info!(
            target: "parlor::brain",
            files = files.len(),
            categories = brain.category_count(),
            "Compiled brain from {}",
            dir.display()
        );
        Ok(brain)
    }

    /// Adds the categories of one AIML document. Returns how many were read.
    pub fn learn_str(&mut self, source: &str) -> Result<usize, BrainError> {
        let categories = loader::parse_aiml(source)?;
        let count = categories.len();
        for category in categories {
            self.graph.insert(&category.pattern, category.template);
        }
        Ok(count)
    }

    /// Loads a compiled brain written by [`Brain::save`]. Predicates start empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BrainError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| BrainError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image: BrainImage =
            serde_json::from_slice(&bytes).map_err(|e| BrainError::Cache(e.to_string()))?;
        if image.format_version != CACHE_FORMAT_VERSION {
            return Err(BrainError::CacheVersion {
                found: image.format_version,
                expected: CACHE_FORMAT_VERSION,
            });
        }
        tracing::info!(
            target: "parlor::brain",
            categories = image.graph.categories(),
            "Loaded brain from {}",
            path.display()
        );
        Ok(Self {
            graph: image.graph,
            predicates: DashMap::new(),
        })
    }

    /// Writes the compiled graph to `path` (via a sibling temp file and rename).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), BrainError> {
        let path = path.as_ref();
        let image = BrainImage {
            format_version: CACHE_FORMAT_VERSION,
            graph: self.graph.clone(),
        };
        let bytes = serde_json::to_vec(&image).map_err(|e| BrainError::Cache(e.to_string()))?;
        let io_err = |source: std::io::Error| BrainError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &bytes).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        tracing::info!(
            target: "parlor::brain",
            bytes = bytes.len(),
            "Saved brain to {}",
            path.display()
        );
        Ok(())
    }

    /// Number of distinct patterns in the knowledge base.
    pub fn category_count(&self) -> usize {
        self.graph.categories()
    }

    /// Current value of a session predicate.
    pub fn predicate(&self, key: &str, session_id: &str) -> Option<String> {
        self.predicates
            .get(session_id)
            .and_then(|session| session.get(key).cloned())
    }

    fn store_predicate(&self, key: &str, value: &str, session_id: &str) {
        self.predicates
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    fn answer(&self, input: &str, session_id: &str, depth: usize) -> Option<String> {
        let words = input_words(input);
        let keys: Vec<String> = words.iter().map(|w| w.to_uppercase()).collect();
        let matched = self.graph.find(&keys)?;
        let stars: Vec<String> = matched
            .stars
            .iter()
            .map(|range| words[range.clone()].join(" "))
            .collect();
        let template = self.graph.template(matched.template)?;
        let rendered = self.render(template, &stars, session_id, depth);
        Some(squash_whitespace_trimmed(&rendered))
    }

    fn render(&self, nodes: &[TemplateNode], stars: &[String], session_id: &str, depth: usize) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                TemplateNode::Text(text) => out.push_str(text),
                TemplateNode::Star(index) => {
                    if let Some(star) = index.checked_sub(1).and_then(|i| stars.get(i)) {
                        out.push_str(star);
                    }
                }
                TemplateNode::Get(name) => {
                    if let Some(value) = self.predicate(name, session_id) {
                        out.push_str(&value);
                    }
                }
                TemplateNode::Set { name, children } => {
                    let value = self.render(children, stars, session_id, depth);
                    let value = value.trim();
                    self.store_predicate(name, value, session_id);
                    out.push_str(value);
                }
                TemplateNode::Think(children) => {
                    self.render(children, stars, session_id, depth);
                }
                TemplateNode::Srai(children) => {
                    if depth >= MAX_SRAI_DEPTH {
                        tracing::warn!(target: "parlor::brain", depth, "srai depth limit reached");
                        continue;
                    }
                    let query = self.render(children, stars, session_id, depth);
                    if let Some(reply) = self.answer(&query, session_id, depth + 1) {
                        out.push_str(&reply);
                    }
                }
                TemplateNode::Uppercase(children) => {
                    out.push_str(&self.render(children, stars, session_id, depth).to_uppercase())
                }
                TemplateNode::Lowercase(children) => {
                    out.push_str(&self.render(children, stars, session_id, depth).to_lowercase())
                }
            }
        }
        out
    }
}

impl DialogueEngine for Brain {
    fn respond(&self, text: &str, session_id: &str) -> Option<String> {
        self.answer(text, session_id, 0)
    }

    fn set_predicate(&self, key: &str, value: &str, session_id: &str) {
        self.store_predicate(key, value, session_id);
    }
}

/// Input words with apostrophes removed (`what's` -> `whats`) and other
/// punctuation split out; case preserved.
fn input_words(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|&c| c != '\'')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Pattern tokens: wildcards kept verbatim, everything else normalized like input.
pub(crate) fn pattern_tokens(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for token in raw.split_whitespace() {
        if token == "*" || token == "_" {
            tokens.push(token.to_string());
        } else {
            tokens.extend(input_words(token).iter().map(|w| w.to_uppercase()));
        }
    }
    tokens
}

fn squash_whitespace_trimmed(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn rule_files(dir: &Path) -> Result<Vec<PathBuf>, BrainError> {
    let io_err = |source: std::io::Error| BrainError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_rule = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| RULE_EXTENSIONS.iter().any(|r| ext.eq_ignore_ascii_case(r)))
            .unwrap_or(false);
        if is_rule && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
