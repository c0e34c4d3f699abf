//! Placeholder templates for `documentation/index.html`.
//!
//! A template is HTML text with `{{ name }}` placeholders. Placeholders are
//! checked when the template is parsed, so a typo fails before any package
//! is touched.

use std::fs;
use std::path::Path;

use crate::error::{DocsError, Result};

/// Template used when the project supplies none.
pub const BUILTIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ model_name }}</title>
  <style>
    body { font-family: sans-serif; max-width: 60em; margin: 2em auto; line-height: 1.5; }
    table { border-collapse: collapse; }
    th, td { border: 1px solid #ccc; padding: 0.2em 0.6em; text-align: left; }
    code, pre { background: #f6f8fa; }
  </style>
</head>
<body>
  <h1>{{ model_name }}</h1>
  {{ content }}
  <h2>Variables</h2>
  <table>
    <tr><th>Name</th><th>Causality</th><th>Unit</th><th>Description</th></tr>
    {{ variables }}
  </table>
  <h2>Simulation</h2>
  <pre>{{ params }}</pre>
  {{ plot }}
</body>
</html>
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ModelName,
    Content,
    Variables,
    Params,
    Plot,
}

impl Field {
    fn from_name(name: &str) -> Option<Field> {
        match name {
            "model_name" => Some(Field::ModelName),
            "content" => Some(Field::Content),
            "variables" => Some(Field::Variables),
            "params" => Some(Field::Params),
            "plot" => Some(Field::Plot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// Values substituted into a template. All except `content` are inserted
/// as given; callers escape them.
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    pub model_name: String,
    /// Rendered HTML of the unit's readme.
    pub content: String,
    /// Table rows, one per model variable.
    pub variables: String,
    /// Simulator arguments used for the reference result.
    pub params: String,
    /// Plot element, or empty.
    pub plot: String,
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text.
    pub fn parse(text: &str) -> Result<Template> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut consumed = 0;
        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let line = line_of(text, consumed + start);
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or(DocsError::UnclosedPlaceholder { line })?;
            let name = after[..end].trim();
            let field = Field::from_name(name).ok_or_else(|| DocsError::UnknownPlaceholder {
                name: name.to_string(),
                line,
            })?;
            segments.push(Segment::Field(field));
            let advance = start + 2 + end + 2;
            consumed += advance;
            rest = &rest[advance..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }
        Ok(Template { segments })
    }

    /// The built-in template.
    pub fn builtin() -> Template {
        match Template::parse(BUILTIN_TEMPLATE) {
            Ok(t) => t,
            // BUILTIN_TEMPLATE only uses known placeholders.
            Err(_) => Template {
                segments: vec![Segment::Text(BUILTIN_TEMPLATE.to_string())],
            },
        }
    }

    /// Read and parse a template file.
    pub fn load(path: &Path) -> Result<Template> {
        let text = fs::read_to_string(path).map_err(|source| DocsError::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;
        Template::parse(&text)
    }

    /// Substitute `values`.
    pub fn render(&self, values: &TemplateValues) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(Field::ModelName) => out.push_str(&values.model_name),
                Segment::Field(Field::Content) => out.push_str(&values.content),
                Segment::Field(Field::Variables) => out.push_str(&values.variables),
                Segment::Field(Field::Params) => out.push_str(&values.params),
                Segment::Field(Field::Plot) => out.push_str(&values.plot),
            }
        }
        out
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholders() {
        let t = Template::parse("<h1>{{model_name}}</h1>{{ content }}").unwrap();
        let html = t.render(&TemplateValues {
            model_name: "Dahlquist".into(),
            content: "<p>x' = -kx</p>".into(),
            ..Default::default()
        });
        assert_eq!(html, "<h1>Dahlquist</h1><p>x' = -kx</p>");
    }

    #[test]
    fn unknown_placeholder_reports_line() {
        let err = Template::parse("a\nb {{ model }}\n").unwrap_err();
        match err {
            DocsError::UnknownPlaceholder { name, line } => {
                assert_eq!(name, "model");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unclosed_placeholder_rejected() {
        assert!(matches!(
            Template::parse("{{ content"),
            Err(DocsError::UnclosedPlaceholder { line: 1 })
        ));
    }

    #[test]
    fn builtin_template_parses() {
        assert!(Template::parse(BUILTIN_TEMPLATE).is_ok());
        let html = Template::builtin().render(&TemplateValues {
            model_name: "Stair".into(),
            ..Default::default()
        });
        assert!(html.contains("<title>Stair</title>"));
        assert!(!html.contains("{{"));
    }
}
