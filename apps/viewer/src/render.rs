//! Text rendering of hierplane-shaped parse trees and lifecycle state.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use client_core::Lifecycle;
use serde::Deserialize;
use serde_json::Value;
use shared::domain::LifecyclePhase;

#[derive(Debug, Deserialize)]
struct HierplaneTree {
    #[serde(default)]
    text: String,
    root: HierplaneNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HierplaneNode {
    word: String,
    #[serde(default)]
    node_type: String,
    #[serde(default)]
    attributes: Vec<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    children: Vec<HierplaneNode>,
}

impl HierplaneNode {
    fn label(&self) -> String {
        let mut label = self.word.clone();
        if !self.node_type.is_empty() {
            let _ = write!(label, " [{}]", self.node_type);
        }
        if !self.attributes.is_empty() {
            let _ = write!(label, " {}", self.attributes.join(" "));
        }
        label
    }
}

pub fn render_tree(tree: &Value) -> Result<String> {
    let tree: HierplaneTree =
        serde_json::from_value(tree.clone()).context("response tree is not a hierplane tree")?;

    let mut out = String::new();
    if !tree.text.is_empty() {
        let _ = writeln!(out, "{}", tree.text);
    }
    let _ = writeln!(out, "{}", tree.root.label());
    render_children(&tree.root.children, "", &mut out);
    Ok(out)
}

fn render_children(children: &[HierplaneNode], prefix: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let branch = if last { "└─" } else { "├─" };
        let link = child.link.as_deref().unwrap_or("");
        let _ = writeln!(out, "{prefix}{branch}{link}─ {}", child.label());
        let next = format!("{prefix}{}", if last { "   " } else { "│  " });
        render_children(&child.children, &next, out);
    }
}

pub fn render_state(state: &Lifecycle) -> String {
    let mut out = format!("state: {}\n", state.phase());
    if let Some(request) = state.request() {
        let _ = writeln!(
            out,
            "request: {:?} (model {}{})",
            request.text,
            request.model,
            if request.collapse_phrases {
                ", noun phrases merged"
            } else {
                ""
            }
        );
    }
    match state.phase() {
        LifecyclePhase::Received => {
            if let Some(tree) = state.tree() {
                match render_tree(tree) {
                    Ok(text) => out.push_str(&text),
                    Err(err) => {
                        let _ = writeln!(out, "{err:#}");
                        let _ = writeln!(out, "{tree}");
                    }
                }
            }
        }
        LifecyclePhase::Error => {
            if let Some(message) = state.error_message() {
                let _ = writeln!(out, "error: {message}");
            }
        }
        LifecyclePhase::Empty | LifecyclePhase::Working => {}
    }
    out
}
