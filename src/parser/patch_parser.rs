use crate::error::{AppError, AppResult};
use lazy_static::lazy_static;
use regex::Regex;

/// Attribute path of a PATCH operation, decomposed per RFC 7644 PATH.
///
/// Only the shapes a directory patch actually uses are recognised: a
/// (possibly schema-qualified) attribute, an optional single `eq` filter,
/// and an optional nested sub-attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchPath {
    /// `displayName`, `phoneNumbers[type eq "work"]`
    Attribute {
        schema: Option<String>,
        attribute: String,
        filter: Option<SubAttributeFilter>,
    },
    /// `name.givenName`, `addresses[type eq "work"].streetAddress`
    Nested {
        schema: Option<String>,
        attribute: String,
        filter: Option<SubAttributeFilter>,
        sub_attribute: String,
    },
}

/// Equality predicate selecting one entry of a multi-valued attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SubAttributeFilter {
    pub attribute: String,
    pub comparison_value: String,
}

lazy_static! {
    static ref PATH_PATTERN: Regex = Regex::new(
        r#"^(?:(?P<schema>urn:[^\[\]]+):)?(?P<attr>[A-Za-z$][\w$-]*)(?:\[\s*(?P<fattr>[A-Za-z$][\w$.-]*)\s+(?i:eq)\s+(?P<fval>"(?:[^"\\]|\\.)*"|[^\s\]]+)\s*\])?(?:\.(?P<sub>[A-Za-z$][\w$-]*))?$"#
    )
    .expect("path pattern is valid");
}

impl PatchPath {
    pub fn parse(path: &str) -> AppResult<Self> {
        let trimmed = path.trim();
        let captures = PATH_PATTERN.captures(trimmed).ok_or_else(|| {
            AppError::UnsupportedPatch(format!("Unsupported attribute path: {}", path))
        })?;

        let schema = captures.name("schema").map(|m| m.as_str().to_string());
        let attribute = captures["attr"].to_string();
        let filter = match (captures.name("fattr"), captures.name("fval")) {
            (Some(fattr), Some(fval)) => Some(SubAttributeFilter {
                attribute: fattr.as_str().to_string(),
                comparison_value: unquote(fval.as_str()),
            }),
            _ => None,
        };

        Ok(match captures.name("sub") {
            Some(sub) => PatchPath::Nested {
                schema,
                attribute,
                filter,
                sub_attribute: sub.as_str().to_string(),
            },
            None => PatchPath::Attribute {
                schema,
                attribute,
                filter,
            },
        })
    }

    pub fn attribute(&self) -> &str {
        match self {
            PatchPath::Attribute { attribute, .. } | PatchPath::Nested { attribute, .. } => {
                attribute
            }
        }
    }

    pub fn schema(&self) -> Option<&str> {
        match self {
            PatchPath::Attribute { schema, .. } | PatchPath::Nested { schema, .. } => {
                schema.as_deref()
            }
        }
    }

    pub fn filter(&self) -> Option<&SubAttributeFilter> {
        match self {
            PatchPath::Attribute { filter, .. } | PatchPath::Nested { filter, .. } => {
                filter.as_ref()
            }
        }
    }

    /// Nested sub-attribute, e.g. `givenName` in `name.givenName`.
    pub fn value_path(&self) -> Option<&str> {
        match self {
            PatchPath::Attribute { .. } => None,
            PatchPath::Nested { sub_attribute, .. } => Some(sub_attribute),
        }
    }
}

fn unquote(raw: &str) -> String {
    match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_attr_path() {
        let path = PatchPath::parse("displayName").unwrap();
        assert_eq!(path.attribute(), "displayName");
        assert!(path.filter().is_none());
        assert!(path.value_path().is_none());
        assert!(path.schema().is_none());
    }

    #[test]
    fn test_parse_nested_attr_path() {
        let path = PatchPath::parse("name.givenName").unwrap();
        assert_eq!(path.attribute(), "name");
        assert_eq!(path.value_path(), Some("givenName"));
    }

    #[test]
    fn test_parse_value_path_with_filter() {
        let path = PatchPath::parse(r#"phoneNumbers[type eq "mobile"]"#).unwrap();
        assert_eq!(path.attribute(), "phoneNumbers");
        let filter = path.filter().unwrap();
        assert_eq!(filter.attribute, "type");
        assert_eq!(filter.comparison_value, "mobile");
        assert!(path.value_path().is_none());
    }

    #[test]
    fn test_parse_value_path_with_filter_and_sub_attr() {
        let path = PatchPath::parse(r#"addresses[type eq "work"].streetAddress"#).unwrap();
        assert_eq!(path.attribute(), "addresses");
        assert_eq!(path.filter().unwrap().comparison_value, "work");
        assert_eq!(path.value_path(), Some("streetAddress"));
    }

    #[test]
    fn test_parse_filter_operator_is_case_insensitive() {
        let path = PatchPath::parse(r#"emails[type EQ "other"]"#).unwrap();
        assert_eq!(path.filter().unwrap().comparison_value, "other");
    }

    #[test]
    fn test_parse_unquoted_filter_value() {
        let path = PatchPath::parse("emails[primary eq true]").unwrap();
        let filter = path.filter().unwrap();
        assert_eq!(filter.attribute, "primary");
        assert_eq!(filter.comparison_value, "true");
    }

    #[test]
    fn test_parse_schema_qualified_path() {
        let path = PatchPath::parse(
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:department",
        )
        .unwrap();
        assert_eq!(path.attribute(), "department");
        assert_eq!(
            path.schema(),
            Some("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User")
        );
    }

    #[test]
    fn test_parse_schema_qualified_nested_path() {
        let path =
            PatchPath::parse("urn:ietf:params:scim:schemas:core:2.0:User:name.familyName").unwrap();
        assert_eq!(path.attribute(), "name");
        assert_eq!(path.value_path(), Some("familyName"));
    }

    #[test]
    fn test_parse_rejects_unsupported_shapes() {
        assert!(matches!(
            PatchPath::parse(r#"members[value eq "a" or value eq "b"]"#),
            Err(AppError::UnsupportedPatch(_))
        ));
        assert!(PatchPath::parse("").is_err());
        assert!(PatchPath::parse("name..givenName").is_err());
        assert!(PatchPath::parse(r#"emails[type eq "work""#).is_err());
    }
}
