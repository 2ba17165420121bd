//! Pattern graph: the compiled form of every category's `<pattern>`.
//!
//! Nodes live in a flat arena so the cache stays shallow when serialized.
//! At each position the match order is `_`, then the exact word, then `*`;
//! both wildcards consume one or more words.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

use super::template::TemplateNode;

const ROOT: usize = 0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Node {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    words: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    underscore: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    star: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<usize>,
}

/// A successful match: the template to render and the word ranges captured by wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Matched {
    pub template: usize,
    pub stars: Vec<Range<usize>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Graph {
    nodes: Vec<Node>,
    templates: Vec<Vec<TemplateNode>>,
    categories: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
            templates: Vec::new(),
            categories: 0,
        }
    }
}

impl Graph {
    /// Adds a category. A pattern seen before keeps its node and takes the new template.
    pub fn insert(&mut self, pattern: &[String], template: Vec<TemplateNode>) {
        let mut node = ROOT;
        for token in pattern {
            node = match token.as_str() {
                "_" => match self.nodes[node].underscore {
                    Some(next) => next,
                    None => {
                        let next = self.push_node();
                        self.nodes[node].underscore = Some(next);
                        next
                    }
                },
                "*" => match self.nodes[node].star {
                    Some(next) => next,
                    None => {
                        let next = self.push_node();
                        self.nodes[node].star = Some(next);
                        next
                    }
                },
                word => match self.nodes[node].words.get(word) {
                    Some(&next) => next,
                    None => {
                        let next = self.push_node();
                        self.nodes[node].words.insert(word.to_string(), next);
                        next
                    }
                },
            };
        }

        self.templates.push(template);
        let index = self.templates.len() - 1;
        if self.nodes[node].template.replace(index).is_none() {
            self.categories += 1;
        }
    }

    /// Number of distinct patterns.
    pub fn categories(&self) -> usize {
        self.categories
    }

    pub fn template(&self, index: usize) -> Option<&[TemplateNode]> {
        self.templates.get(index).map(Vec::as_slice)
    }

    /// Matches normalized (upper-cased) input words.
    pub fn find(&self, words: &[String]) -> Option<Matched> {
        if words.is_empty() {
            return None;
        }
        let mut stars = Vec::new();
        self.walk(ROOT, words, 0, &mut stars)
            .map(|template| Matched { template, stars })
    }

    fn push_node(&mut self) -> usize {
        self.nodes.push(Node::default());
        self.nodes.len() - 1
    }

    fn walk(
        &self,
        node: usize,
        words: &[String],
        pos: usize,
        stars: &mut Vec<Range<usize>>,
    ) -> Option<usize> {
        let current = self.nodes.get(node)?;
        if pos == words.len() {
            return current.template;
        }
        if let Some(next) = current.underscore {
            if let Some(found) = self.wildcard(next, words, pos, stars) {
                return Some(found);
            }
        }
        if let Some(&next) = current.words.get(&words[pos]) {
            if let Some(found) = self.walk(next, words, pos + 1, stars) {
                return Some(found);
            }
        }
        if let Some(next) = current.star {
            if let Some(found) = self.wildcard(next, words, pos, stars) {
                return Some(found);
            }
        }
        None
    }

    fn wildcard(
        &self,
        next: usize,
        words: &[String],
        pos: usize,
        stars: &mut Vec<Range<usize>>,
    ) -> Option<usize> {
        for end in pos + 1..=words.len() {
            stars.push(pos..end);
            if let Some(found) = self.walk(next, words, end, stars) {
                return Some(found);
            }
            stars.pop();
        }
        None
    }
}
