//! Content type domain model
//!
//! A content type describes a document type in the CMS: its properties,
//! which templates may render it, which content types may be created below
//! it, and which content types it is composed of.

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, StoreMeta};
use super::id::{ArtifactId, ArtifactKey, ArtifactKind};

/// A property on a content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub name: String,
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mandatory: bool,
    /// Data type providing the property editor
    pub data_type: ArtifactId,
    /// Tab / group the property is shown in
    pub group: String,
}

/// An allowed child content type with its position in the allowed list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeSort {
    pub id: ArtifactId,
    pub sort_order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
    #[serde(flatten)]
    pub meta: StoreMeta,

    pub name: String,

    pub alias: ArtifactKey,

    #[serde(default)]
    pub allowed_as_root: bool,

    #[serde(default)]
    pub thumbnail: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub properties: Vec<PropertyType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_templates: Vec<ArtifactId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_template: Option<ArtifactId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_content_types: Vec<ContentTypeSort>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compositions: Vec<ArtifactId>,
}

impl ContentType {
    pub fn new(name: impl Into<String>, alias: ArtifactKey) -> Self {
        Self {
            meta: StoreMeta::default(),
            name: name.into(),
            alias,
            allowed_as_root: false,
            thumbnail: String::new(),
            description: String::new(),
            properties: Vec::new(),
            allowed_templates: Vec::new(),
            default_template: None,
            allowed_content_types: Vec::new(),
            compositions: Vec::new(),
        }
    }

    /// Adds a property unless one with the same alias is already present
    ///
    /// Returns `false` (and leaves the properties unchanged) on a repeated alias.
    pub fn add_property(&mut self, property: PropertyType) -> bool {
        if self.properties.iter().any(|p| p.alias == property.alias) {
            return false;
        }
        self.properties.push(property);
        true
    }

    /// Adds an allowed template if not already present
    pub fn allow_template(&mut self, template: ArtifactId) {
        if !self.allowed_templates.contains(&template) {
            self.allowed_templates.push(template);
        }
    }

    /// Sets the default template, which is always also an allowed template
    pub fn set_default_template(&mut self, template: Option<ArtifactId>) {
        if let Some(id) = &template {
            self.allow_template(id.clone());
        }
        self.default_template = template;
    }

}

impl Artifact for ContentType {
    const KIND: ArtifactKind = ArtifactKind::ContentType;

    fn key(&self) -> &ArtifactKey {
        &self.alias
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut StoreMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ArtifactId {
        s.parse().unwrap()
    }

    fn property(alias: &str, group: &str) -> PropertyType {
        PropertyType {
            name: alias.to_string(),
            alias: alias.to_string(),
            description: String::new(),
            mandatory: false,
            data_type: id("dt-0000001"),
            group: group.to_string(),
        }
    }

    #[test]
    fn default_template_is_allowed() {
        let mut ct = ContentType::new("Home", ArtifactKey::new("home").unwrap());
        ct.allow_template(id("tp-0000001"));
        ct.set_default_template(Some(id("tp-0000002")));

        assert_eq!(ct.default_template, Some(id("tp-0000002")));
        assert_eq!(ct.allowed_templates, vec![id("tp-0000001"), id("tp-0000002")]);
    }

    #[test]
    fn allow_template_is_deduplicated() {
        let mut ct = ContentType::new("Home", ArtifactKey::new("home").unwrap());
        ct.allow_template(id("tp-0000001"));
        ct.set_default_template(Some(id("tp-0000001")));

        assert_eq!(ct.allowed_templates.len(), 1);
    }

    #[test]
    fn repeated_property_alias_is_refused() {
        let mut ct = ContentType::new("Home", ArtifactKey::new("home").unwrap());
        assert!(ct.add_property(property("title", "Content")));
        assert!(ct.add_property(property("body", "Content")));
        assert!(!ct.add_property(property("title", "SEO")));

        assert_eq!(ct.properties.len(), 2);
        assert_eq!(ct.properties[0].group, "Content");
    }

    #[test]
    fn serializes_without_empty_links() {
        let ct = ContentType::new("Home", ArtifactKey::new("home").unwrap());
        let json = serde_json::to_value(&ct).unwrap();

        assert_eq!(json["alias"], "home");
        assert!(json.get("compositions").is_none());
        assert!(json.get("id").is_none());
    }
}
