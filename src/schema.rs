//! Site schema declarations and field-level resolution.
//!
//! A small registry of type and field definitions with reusable field
//! extensions. The only extension today is `default-list`: when a source
//! value provides no data for a list field, resolution substitutes an empty
//! list instead of null, so downstream consumers never need null-checks.
//!
//! This is deliberately not a query engine; it only shapes values that are
//! about to be consumed (menu links from site configuration).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Schema resolution errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown schema type `{0}`")]
    UnknownType(String),

    #[error("value for type `{type_name}` is not an object")]
    NotAnObject { type_name: String },

    #[error("type `{type_name}` requires field `{field}`")]
    MissingRequired { type_name: String, field: String },
}

/// Reusable field-level resolution rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldExtension {
    /// Substitute an empty list when the source value is absent or null
    DefaultList,
}

/// A field declaration within a type.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub required: bool,
    /// Element type for list fields, resolved recursively
    pub item_type: Option<&'static str>,
    pub extension: Option<FieldExtension>,
}

impl FieldDef {
    const fn required(name: &'static str) -> Self {
        Self { name, required: true, item_type: None, extension: None }
    }

    const fn optional(name: &'static str) -> Self {
        Self { name, required: false, item_type: None, extension: None }
    }

    const fn default_list(name: &'static str, item_type: &'static str) -> Self {
        Self {
            name,
            required: false,
            item_type: Some(item_type),
            extension: Some(FieldExtension::DefaultList),
        }
    }
}

/// A named type declaration.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: &'static str,
    pub fields: Vec<FieldDef>,
}

/// Registry of declared types.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: BTreeMap<&'static str, TypeDef>,
}

impl Schema {
    /// Declare a type. Later declarations with the same name replace earlier
    /// ones.
    pub fn declare(&mut self, type_def: TypeDef) {
        self.types.insert(type_def.name, type_def);
    }

    /// The site's schema: menu links with an optional sub-menu list.
    pub fn site_schema() -> Self {
        let mut schema = Self::default();
        schema.declare(TypeDef {
            name: "MenuLink",
            fields: vec![
                FieldDef::required("name"),
                FieldDef::required("link"),
                FieldDef::default_list("sub_menu", "SubMenu"),
            ],
        });
        schema.declare(TypeDef {
            name: "SubMenu",
            fields: vec![FieldDef::optional("name"), FieldDef::optional("link")],
        });
        schema
    }

    /// Resolve a source value against a declared type.
    ///
    /// Produces a new value with field extensions applied; the source is
    /// never mutated. Required fields must be present and non-null.
    pub fn resolve(&self, type_name: &str, source: &Value) -> Result<Value, SchemaError> {
        let type_def = self
            .types
            .get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_owned()))?;

        let source_map = source
            .as_object()
            .ok_or_else(|| SchemaError::NotAnObject { type_name: type_name.to_owned() })?;

        let mut resolved = source_map.clone();
        for field in &type_def.fields {
            let current = resolved.get(field.name);
            let is_missing = current.is_none_or(Value::is_null);

            if is_missing {
                if field.required {
                    return Err(SchemaError::MissingRequired {
                        type_name: type_name.to_owned(),
                        field: field.name.to_owned(),
                    });
                }
                if field.extension == Some(FieldExtension::DefaultList) {
                    resolved.insert(field.name.to_owned(), Value::Array(Vec::new()));
                }
                continue;
            }

            // Recurse into typed list elements
            if let (Some(item_type), Some(Value::Array(items))) = (field.item_type, current) {
                let items = items
                    .iter()
                    .map(|item| self.resolve(item_type, item))
                    .collect::<Result<Vec<_>, _>>()?;
                resolved.insert(field.name.to_owned(), Value::Array(items));
            }
        }

        Ok(Value::Object(resolved))
    }
}

/// A navigation entry, resolved so `sub_menu` is always a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuLink {
    pub name: String,
    pub link: String,
    #[serde(default)]
    pub sub_menu: Vec<SubMenu>,
}

/// A nested navigation entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubMenu {
    pub name: Option<String>,
    pub link: Option<String>,
}

/// Resolve configured menu links into typed values.
///
/// The raw entries come from `[site] menu_links` in the config file; each is
/// resolved against the `MenuLink` declaration before deserialization, so
/// every returned link has a concrete (possibly empty) sub-menu.
pub fn resolve_menu_links(raw: &[toml::Value]) -> Result<Vec<MenuLink>> {
    let schema = Schema::site_schema();
    raw.iter()
        .map(|entry| {
            let value = serde_json::to_value(entry).context("menu link is not valid data")?;
            let resolved = schema
                .resolve("MenuLink", &value)
                .context("invalid [site] menu_links entry")?;
            serde_json::from_value(resolved).context("invalid [site] menu_links entry")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_sub_menu_resolves_to_empty_list() {
        let schema = Schema::site_schema();
        let source = json!({"name": "Home", "link": "/"});

        let resolved = schema.resolve("MenuLink", &source).unwrap();
        assert_eq!(resolved["sub_menu"], json!([]));
        assert!(!resolved["sub_menu"].is_null());
    }

    #[test]
    fn test_null_sub_menu_resolves_to_empty_list() {
        let schema = Schema::site_schema();
        let source = json!({"name": "Home", "link": "/", "sub_menu": null});

        let resolved = schema.resolve("MenuLink", &source).unwrap();
        assert_eq!(resolved["sub_menu"], json!([]));
    }

    #[test]
    fn test_resolution_does_not_mutate_source() {
        let schema = Schema::site_schema();
        let source = json!({"name": "Home", "link": "/"});
        let snapshot = source.clone();

        schema.resolve("MenuLink", &source).unwrap();
        assert_eq!(source, snapshot);
        assert!(source.get("sub_menu").is_none());
    }

    #[test]
    fn test_present_sub_menu_passes_through() {
        let schema = Schema::site_schema();
        let source = json!({
            "name": "Projects",
            "link": "/projects",
            "sub_menu": [{"name": "Web2 2020", "link": "/projects/2020"}],
        });

        let resolved = schema.resolve("MenuLink", &source).unwrap();
        assert_eq!(resolved["sub_menu"][0]["name"], json!("Web2 2020"));
    }

    #[test]
    fn test_missing_required_field() {
        let schema = Schema::site_schema();
        let err = schema.resolve("MenuLink", &json!({"name": "Home"})).unwrap_err();
        assert!(matches!(err, SchemaError::MissingRequired { ref field, .. } if field == "link"));
    }

    #[test]
    fn test_unknown_type() {
        let schema = Schema::site_schema();
        let err = schema.resolve("SiteMetadata", &json!({})).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType(_)));
    }

    #[test]
    fn test_non_object_source() {
        let schema = Schema::site_schema();
        let err = schema.resolve("MenuLink", &json!("home")).unwrap_err();
        assert!(matches!(err, SchemaError::NotAnObject { .. }));
    }

    #[test]
    fn test_sub_menu_entries_may_be_partial() {
        let schema = Schema::site_schema();
        let source = json!({
            "name": "Docs",
            "link": "/docs",
            "sub_menu": [{"name": "Setup"}],
        });

        let resolved = schema.resolve("MenuLink", &source).unwrap();
        assert_eq!(resolved["sub_menu"][0]["name"], json!("Setup"));
        assert!(resolved["sub_menu"][0].get("link").is_none());
    }

    #[test]
    fn test_resolve_menu_links_from_toml() {
        let table: toml::Value = toml::from_str(
            r#"
            [[menu_links]]
            name = "Home"
            link = "/"

            [[menu_links]]
            name = "Projects"
            link = "/projects"

            [[menu_links.sub_menu]]
            name = "Web2 2020"
            link = "/projects/2020"
            "#,
        )
        .unwrap();
        let raw = table["menu_links"].as_array().unwrap().clone();

        let links = resolve_menu_links(&raw).unwrap();
        assert_eq!(links.len(), 2);
        assert!(links[0].sub_menu.is_empty());
        assert_eq!(links[1].sub_menu.len(), 1);
        assert_eq!(links[1].sub_menu[0].name.as_deref(), Some("Web2 2020"));
    }

    #[test]
    fn test_resolve_menu_links_missing_link_fails() {
        let table: toml::Value = toml::from_str(
            r#"
            [[menu_links]]
            name = "Broken"
            "#,
        )
        .unwrap();
        let raw = table["menu_links"].as_array().unwrap().clone();

        assert!(resolve_menu_links(&raw).is_err());
    }
}
