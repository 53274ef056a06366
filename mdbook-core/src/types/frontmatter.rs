//! YAML frontmatter of Markdown files

use super::Status;
use crate::error::ParseError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn frontmatter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\A---(\r?\n.*?\r?\n)---\r?\n(.*)\z").expect("valid frontmatter regex")
    })
}

/// Position of an item in the explicit ordering stored in `index.md`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOrder {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemOrder>,
}

/// Frontmatter key/value mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter(Mapping);

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(mapping: Mapping) -> Self {
        Self(mapping)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String value; numbers are converted since YAML reads `year: 2001` as a number
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Bool(true)))
    }

    /// List of strings; a single string is returned as a one-element list
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Set the value, or remove the key if the value is empty
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if is_empty_value(&value) {
            self.0.remove(key);
        } else {
            self.0.insert(Value::String(key.to_string()), value);
        }
    }

    /// Set the value unconditionally
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(Value::String(key.to_string()), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn title(&self) -> Option<String> {
        self.get_string("title").filter(|t| !t.is_empty())
    }

    pub fn status(&self) -> Option<Status> {
        self.get_string("status").and_then(|s| Status::lookup(&s))
    }

    /// Explicit ordering of items, if any
    pub fn items_order(&self) -> Vec<ItemOrder> {
        let Some(value) = self.0.get("items") else {
            return Vec::new();
        };
        match serde_yaml::from_value(value.clone()) {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!("Ignoring malformed item order: {}", e);
                Vec::new()
            }
        }
    }

    pub fn set_items_order(&mut self, order: &[ItemOrder]) {
        match serde_yaml::to_value(order) {
            Ok(value) => self.set("items", value),
            Err(e) => tracing::warn!("Failed to serialize item order: {}", e),
        }
    }

    /// Sub-mapping stored under the key, e.g. export settings under `docx`
    pub fn get_mapping(&self, key: &str) -> Option<&Mapping> {
        match self.0.get(key) {
            Some(Value::Mapping(m)) => Some(m),
            _ => None,
        }
    }

    /// Entries sorted by key, for stable output and digests
    pub fn sorted(&self) -> BTreeMap<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| (key_string(k), v.clone()))
            .collect()
    }

    /// Serialize as YAML with sorted keys
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.sorted())
    }
}

fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(m) => m.is_empty(),
        _ => false,
    }
}

/// Split file content into frontmatter and Markdown body
pub fn split_frontmatter(content: &str, path: &str) -> Result<(Frontmatter, String), ParseError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok((Frontmatter::new(), content.to_string()));
    };
    let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let value: Value = serde_yaml::from_str(yaml).map_err(|e| ParseError::Frontmatter {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    let frontmatter = match value {
        Value::Null => Frontmatter::new(),
        Value::Mapping(m) => Frontmatter(m),
        _ => {
            return Err(ParseError::Frontmatter {
                path: path.to_string(),
                message: "frontmatter is not a mapping".to_string(),
            })
        }
    };
    Ok((frontmatter, body.to_string()))
}

/// Render frontmatter and Markdown body back into file content
pub fn join_frontmatter(frontmatter: &Frontmatter, content: &str) -> Result<String, ParseError> {
    let mut output = String::new();
    if !frontmatter.is_empty() {
        let yaml = frontmatter
            .to_yaml()
            .map_err(|e| ParseError::MalformedContent(e.to_string()))?;
        output.push_str("---\n");
        output.push_str(&yaml);
        output.push_str("---\n");
    }
    output.push_str(content);
    Ok(output)
}

/// Clean up edited Markdown: right-trim lines, collapse consecutive empty lines
pub fn cleanup_content(content: &str) -> String {
    let mut lines = Vec::new();
    let mut prev_empty = false;
    for line in content.split('\n') {
        let line = line.trim_end();
        let empty = line.is_empty();
        if empty && prev_empty {
            continue;
        }
        prev_empty = empty;
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_with_frontmatter() {
        let content = "---\ntitle: Chapter One\nstatus: draft\n---\nSome *text*.\n";
        let (fm, body) = split_frontmatter(content, "a.md").unwrap();
        assert_eq!(fm.title().as_deref(), Some("Chapter One"));
        assert_eq!(fm.status(), Some(Status::Draft));
        assert_eq!(body, "Some *text*.\n");
    }

    #[test]
    fn test_split_without_frontmatter() {
        let (fm, body) = split_frontmatter("Just text.", "a.md").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "Just text.");
    }

    #[test]
    fn test_split_invalid_yaml() {
        let result = split_frontmatter("---\n: [unclosed\n---\nx", "bad.md");
        assert!(matches!(result, Err(ParseError::Frontmatter { .. })));
    }

    #[test]
    fn test_join_roundtrip_sorted() {
        let mut fm = Frontmatter::new();
        fm.set("title", "T");
        fm.set("authors", vec!["B".to_string(), "A".to_string()]);
        let text = join_frontmatter(&fm, "Body\n").unwrap();
        assert!(text.starts_with("---\nauthors:\n"));
        assert!(text.ends_with("---\nBody\n"));

        let (back, body) = split_frontmatter(&text, "x.md").unwrap();
        assert_eq!(back.get_strings("authors"), vec!["B", "A"]);
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_set_empty_removes() {
        let mut fm = Frontmatter::new();
        fm.set("subtitle", "Sub");
        assert!(fm.contains("subtitle"));
        fm.set("subtitle", "");
        assert!(!fm.contains("subtitle"));
        fm.set("exclude", false);
        assert!(!fm.contains("exclude"));
    }

    #[test]
    fn test_numeric_year_as_string() {
        let (fm, _) = split_frontmatter("---\nyear: 1859\n---\n", "r.md").unwrap();
        assert_eq!(fm.get_string("year").as_deref(), Some("1859"));
    }

    #[test]
    fn test_items_order() {
        let yaml = "---\nitems:\n- name: intro\n  title: Intro\n- name: part\n  items:\n  - name: one\n---\n";
        let (fm, _) = split_frontmatter(yaml, "index.md").unwrap();
        let order = fm.items_order();
        assert_eq!(order.len(), 2);
        assert_eq!(order[1].items[0].name, "one");
    }

    #[test]
    fn test_cleanup_content() {
        let cleaned = cleanup_content("line one   \n\n\n\nline two\t\n");
        assert_eq!(cleaned, "line one\n\nline two\n");
    }

    #[test]
    fn test_malformed_items_order_is_ignored() {
        let (fm, _) = split_frontmatter("---\nitems: chapter one\n---\n", "index.md").unwrap();
        assert!(fm.items_order().is_empty());
    }
}
