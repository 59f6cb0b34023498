//! Package metadata and the `<%= pkg.<field> %>` path templates rendered
//! against it.

use std::fs;
use std::io::ErrorKind;

use camino::Utf8Path;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ConfigLoadError, TemplateError};

/// Top-level fields of `package.json`. Only `name` is required, the rest is
/// kept around for templates.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMetadata {
    name: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl PackageMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Map::new(),
        }
    }

    pub fn load(path: &Utf8Path) -> Result<Self, ConfigLoadError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConfigLoadError::Missing(path.to_path_buf()));
            }
            Err(e) => return Err(ConfigLoadError::Read(path.to_path_buf(), e)),
        };

        Self::parse(&text).map_err(|e| match e {
            ParseError::Json(e) => ConfigLoadError::Parse(path.to_path_buf(), e),
            ParseError::EmptyName => ConfigLoadError::EmptyName(path.to_path_buf()),
        })
    }

    fn parse(text: &str) -> Result<Self, ParseError> {
        let meta: Self = serde_json::from_str(text).map_err(ParseError::Json)?;
        if meta.name.trim().is_empty() {
            return Err(ParseError::EmptyName);
        }
        Ok(meta)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a top-level field as text. Strings are returned unquoted,
    /// numbers and booleans in their JSON form, anything else is absent.
    pub fn field(&self, key: &str) -> Option<String> {
        if key == "name" {
            return Some(self.name.clone());
        }

        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug)]
enum ParseError {
    Json(serde_json::Error),
    EmptyName,
}

const OPEN: &str = "<%=";
const CLOSE: &str = "%>";

/// Render a path template such as `dist/css/<%= pkg.name %>.css`.
pub fn render(template: &str, pkg: &PackageMetadata) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);

        let after = &rest[start + OPEN.len()..];
        let end = after
            .find(CLOSE)
            .ok_or_else(|| TemplateError::Unterminated(template.to_string()))?;

        let expr = after[..end].trim();
        let field = expr
            .strip_prefix("pkg.")
            .filter(|field| !field.is_empty())
            .ok_or_else(|| TemplateError::Unsupported(expr.to_string()))?;

        let value = pkg
            .field(field)
            .ok_or_else(|| TemplateError::MissingField(field.to_string()))?;

        out.push_str(&value);
        rest = &after[end + CLOSE.len()..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_name() {
        let pkg = PackageMetadata::new("ghost-ui");

        assert_eq!(
            render("dist/css/<%= pkg.name %>.css", &pkg).unwrap(),
            "dist/css/ghost-ui.css"
        );
        assert_eq!(
            render("dist/css/<%=pkg.name%>.min.css", &pkg).unwrap(),
            "dist/css/ghost-ui.min.css"
        );
        assert_eq!(render("no/tags.css", &pkg).unwrap(), "no/tags.css");
    }

    #[test]
    fn test_render_other_fields() {
        let pkg = PackageMetadata::new("ghost-ui")
            .with_field("version", "0.1.0")
            .with_field("build", 7);

        assert_eq!(
            render("<%= pkg.name %>-<%= pkg.version %>+<%= pkg.build %>", &pkg).unwrap(),
            "ghost-ui-0.1.0+7"
        );
    }

    #[test]
    fn test_render_errors() {
        let pkg = PackageMetadata::new("ghost-ui");

        assert_eq!(
            render("<%= pkg.name", &pkg),
            Err(TemplateError::Unterminated("<%= pkg.name".into()))
        );
        assert_eq!(
            render("<%= grunt.today %>", &pkg),
            Err(TemplateError::Unsupported("grunt.today".into()))
        );
        assert_eq!(
            render("<%= pkg.author %>", &pkg),
            Err(TemplateError::MissingField("author".into()))
        );
    }

    #[test]
    fn test_parse() {
        let pkg =
            PackageMetadata::parse(r#"{"name": "ghost-ui", "version": "0.1.0", "private": true}"#)
                .unwrap();

        assert_eq!(pkg.name(), "ghost-ui");
        assert_eq!(pkg.field("version").as_deref(), Some("0.1.0"));
        assert_eq!(pkg.field("private").as_deref(), Some("true"));
        assert_eq!(pkg.field("missing"), None);

        assert!(matches!(
            PackageMetadata::parse(r#"{"name": "  "}"#),
            Err(ParseError::EmptyName)
        ));
        assert!(matches!(
            PackageMetadata::parse(r#"{"version": "1"}"#),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("package.json");

        assert!(matches!(
            PackageMetadata::load(&path),
            Err(ConfigLoadError::Missing(p)) if p == path
        ));
    }
}
