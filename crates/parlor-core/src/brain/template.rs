//! Template elements supported by the brain.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TemplateNode {
    Text(String),
    /// `<star/>` / `<star index="n"/>`; 1-based.
    Star(usize),
    /// `<get name="k"/>`
    Get(String),
    /// `<set name="k">…</set>`: stores the rendered children and yields them.
    Set { name: String, children: Vec<TemplateNode> },
    /// `<think>…</think>`: evaluated for side effects, yields nothing.
    Think(Vec<TemplateNode>),
    /// `<srai>…</srai>`: the rendered children are answered as a new input.
    Srai(Vec<TemplateNode>),
    Uppercase(Vec<TemplateNode>),
    Lowercase(Vec<TemplateNode>),
}

/// Collapses whitespace runs to one space, keeping a single leading/trailing space
/// so text stays separated from adjacent elements.
pub(crate) fn squash_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}
