use super::{invalid_key, key_from, verify_acyclic};
use crate::deploy::adapter::{KindAdapter, LinkContext};
use crate::deploy::error::StepError;
use crate::deploy::resolver::ReferenceResolver;
use crate::domain::{
    Artifact, ArtifactKey, ArtifactKind, ContentType, ContentTypeSort, DataType, IdError,
    PropertyType, Template,
};
use crate::manifest::{ContentTypeDefinition, PropertyDefinition};
use crate::storage::{ArtifactStore, StoreError};

/// Content types: keyed by alias
///
/// Properties are bound to data types while building, since data types are
/// a separate kind that must already exist. Template, child-type and
/// composition references are assigned in the link phase.
pub struct ContentTypeAdapter<'s, S> {
    store: &'s S,
}

impl<'s, S> ContentTypeAdapter<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }
}

/// Binds a property definition to the data type named by its `Type`
fn build_property(
    owner: &ArtifactKey,
    definition: &PropertyDefinition,
    data_types: &[DataType],
) -> Result<PropertyType, StepError> {
    let alias = definition.alias.trim();
    if alias.is_empty() {
        return Err(StepError::validation(
            ContentType::KIND,
            owner,
            format!("property '{}' has no alias", definition.name),
        ));
    }

    let wanted = definition.data_type.trim();
    let data_type = data_types
        .iter()
        .find(|dt| dt.name.as_str().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            StepError::validation(
                ContentType::KIND,
                owner,
                format!("property '{}' uses unknown data type '{}'", alias, wanted),
            )
        })?;

    let data_type_id = data_type.id().cloned().ok_or_else(|| {
        StoreError::Corrupt(format!("data type '{}' has no id", data_type.name))
    })?;

    Ok(PropertyType {
        name: definition.name.clone(),
        alias: alias.to_string(),
        description: definition.description.clone(),
        mandatory: definition.mandatory,
        data_type: data_type_id,
        group: definition.group.clone(),
    })
}

impl<'s, S> KindAdapter for ContentTypeAdapter<'s, S>
where
    S: ArtifactStore<ContentType> + ArtifactStore<Template> + ArtifactStore<DataType>,
{
    type Definition = ContentTypeDefinition;
    type Artifact = ContentType;

    fn key(&self, definition: &ContentTypeDefinition) -> Result<ArtifactKey, IdError> {
        key_from(&definition.alias)
    }

    fn build(&self, definition: &ContentTypeDefinition) -> Result<ContentType, StepError> {
        let alias = self
            .key(definition)
            .map_err(|e| invalid_key::<ContentType>(&definition.alias, e))?;

        let mut content_type = ContentType::new(definition.name.clone(), alias.clone());
        content_type.allowed_as_root = definition.allowed_as_root;
        content_type.thumbnail = definition.thumbnail.clone();
        content_type.description = definition.description.clone();

        if !definition.properties.is_empty() {
            let data_types = ArtifactStore::<DataType>::list_all(self.store)?;
            for property in &definition.properties {
                let property = build_property(&alias, property, &data_types)?;
                let property_alias = property.alias.clone();
                if !content_type.add_property(property) {
                    return Err(StepError::validation(
                        ContentType::KIND,
                        &alias,
                        format!("property alias '{}' is used more than once", property_alias),
                    ));
                }
            }
        }

        Ok(content_type)
    }

    fn link(
        &self,
        definition: &ContentTypeDefinition,
        content_type: &mut ContentType,
        links: &mut LinkContext,
    ) -> Result<bool, StepError> {
        const KIND: ArtifactKind = ContentType::KIND;

        let before = content_type.clone();
        let owner = content_type.alias.clone();
        let templates = ReferenceResolver::<S, Template>::new(self.store);
        let content_types = ReferenceResolver::<S, ContentType>::new(self.store);

        let allowed = templates.resolve_all(&definition.allowed_templates)?;
        for template in links.accept(KIND, &owner, "AllowedTemplates", allowed)? {
            content_type.allow_template(template.id);
        }

        if let Some(default) = definition.default_template.as_deref() {
            let resolution = templates.resolve_one(default)?;
            if let Some(template) = links
                .accept(KIND, &owner, "DefaultTemplate", resolution)?
                .into_iter()
                .next()
            {
                content_type.set_default_template(Some(template.id));
            }
        }

        let children = content_types.resolve(&definition.allowed_content_types)?;
        content_type.allowed_content_types = links
            .accept(KIND, &owner, "AllowedContentTypes", children)?
            .into_iter()
            .map(|r| ContentTypeSort {
                id: r.id,
                sort_order: r.position,
            })
            .collect();

        let compositions = content_types.resolve(&definition.content_type_composition)?;
        for composition in links.accept(KIND, &owner, "ContentTypeComposition", compositions)? {
            if Some(&composition.id) == content_type.id() {
                return Err(StepError::validation(
                    KIND,
                    &owner,
                    "a content type cannot be composed of itself",
                ));
            }
            if !content_type.compositions.contains(&composition.id) {
                content_type.compositions.push(composition.id);
            }
        }

        Ok(*content_type != before)
    }

    fn verify(&self, linked: &[ContentType]) -> Result<(), StepError> {
        verify_acyclic(linked, |ct| ct.compositions.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{DeployError, Deployer, Phase};
    use crate::domain::DatabaseType;
    use crate::storage::MemoryStore;

    fn key(s: &str) -> ArtifactKey {
        ArtifactKey::new(s).unwrap()
    }

    fn definition(alias: &str) -> ContentTypeDefinition {
        ContentTypeDefinition {
            name: alias.to_string(),
            alias: alias.to_string(),
            allowed_as_root: false,
            allowed_templates: vec![],
            thumbnail: "folder.png".to_string(),
            description: String::new(),
            properties: vec![],
            default_template: None,
            allowed_content_types: String::new(),
            content_type_composition: String::new(),
        }
    }

    fn property(alias: &str, data_type: &str) -> PropertyDefinition {
        PropertyDefinition {
            name: alias.to_string(),
            alias: alias.to_string(),
            description: String::new(),
            mandatory: false,
            data_type: data_type.to_string(),
            group: "Content".to_string(),
        }
    }

    fn store_with_templates(aliases: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for alias in aliases {
            store.create(Template::new(*alias, key(alias), "")).unwrap();
        }
        store
    }

    #[test]
    fn properties_bind_to_data_type_by_name() {
        let store = MemoryStore::new();
        let textstring = store
            .create(DataType::new(key("Textstring"), "Umbraco.Textbox", DatabaseType::Nvarchar))
            .unwrap();

        let mut page = definition("page");
        page.properties.push(property("title", "textstring"));

        let created = ContentTypeAdapter::new(&store).build(&page).unwrap();
        assert_eq!(created.properties[0].data_type, textstring.id().cloned().unwrap());
        assert_eq!(created.thumbnail, "folder.png");
    }

    #[test]
    fn unknown_property_type_fails_create() {
        let store = MemoryStore::new();
        let mut page = definition("page");
        page.properties.push(property("title", "Nope"));

        let err = Deployer::new(&store, ContentTypeAdapter::new(&store))
            .deploy(&[definition("first"), page])
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::Aborted {
                phase: Phase::Create,
                cause: StepError::Validation { .. },
                ..
            }
        ));
        assert_eq!(store.len_of(ArtifactKind::ContentType), 0);
    }

    #[test]
    fn repeated_property_alias_fails_create() {
        let store = MemoryStore::new();
        store
            .create(DataType::new(key("Textstring"), "Umbraco.Textbox", DatabaseType::Nvarchar))
            .unwrap();
        store
            .create(DataType::new(key("Richtext"), "Umbraco.TinyMCE", DatabaseType::Ntext))
            .unwrap();

        let mut page = definition("page");
        page.properties.push(property("title", "Textstring"));
        page.properties.push(property("body", "Richtext"));
        page.properties.push(property("title", "Richtext"));

        let err = Deployer::new(&store, ContentTypeAdapter::new(&store))
            .deploy(&[definition("first"), page])
            .unwrap_err();

        match err {
            DeployError::Aborted {
                phase: Phase::Create,
                cause: StepError::Validation { key, message, .. },
                rollback,
                ..
            } => {
                assert_eq!(key, "page");
                assert!(message.contains("'title'"));
                assert_eq!(rollback.deleted, vec![self::key("first")]);
            }
            other => panic!("expected create-phase validation abort, got {other}"),
        }
        assert_eq!(store.len_of(ArtifactKind::ContentType), 0);
    }

    #[test]
    fn links_templates_children_and_compositions() {
        let store = store_with_templates(&["home", "text"]);

        let mut home = definition("homePage");
        home.allowed_templates = vec!["text".to_string()];
        home.default_template = Some("home".to_string());
        home.allowed_content_types = "textPage,missing,homePage".to_string();

        let mut text = definition("textPage");
        text.content_type_composition = "seo".to_string();

        let seo = definition("seo");

        let report = Deployer::new(&store, ContentTypeAdapter::new(&store))
            .deploy(&[home, text, seo])
            .unwrap();
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].field, "AllowedContentTypes");

        let find = |alias: &str| -> ContentType { store.find_by_key(&key(alias)).unwrap().unwrap() };
        let home = find("homePage");
        let text = find("textPage");
        let seo = find("seo");
        let template = |alias: &str| -> Template { store.find_by_key(&key(alias)).unwrap().unwrap() };

        let home_template = template("home").id().cloned().unwrap();
        let text_template = template("text").id().cloned().unwrap();
        assert_eq!(home.default_template, Some(home_template.clone()));
        assert_eq!(home.allowed_templates, vec![text_template, home_template]);

        let children: Vec<_> = home
            .allowed_content_types
            .iter()
            .map(|c| (c.id.clone(), c.sort_order))
            .collect();
        assert_eq!(
            children,
            vec![
                (text.id().cloned().unwrap(), 0),
                (home.id().cloned().unwrap(), 2)
            ]
        );
        assert_eq!(text.compositions, vec![seo.id().cloned().unwrap()]);
    }

    #[test]
    fn self_composition_is_rejected() {
        let store = MemoryStore::new();
        let mut page = definition("page");
        page.content_type_composition = "page".to_string();

        let err = Deployer::new(&store, ContentTypeAdapter::new(&store))
            .deploy(&[page])
            .unwrap_err();

        assert!(matches!(err, DeployError::Aborted { phase: Phase::Link, .. }));
        assert_eq!(store.len_of(ArtifactKind::ContentType), 0);
    }

    #[test]
    fn composition_cycle_is_rejected() {
        let store = MemoryStore::new();
        let mut a = definition("a");
        a.content_type_composition = "b".to_string();
        let mut b = definition("b");
        b.content_type_composition = "a".to_string();

        let err = Deployer::new(&store, ContentTypeAdapter::new(&store))
            .deploy(&[a, b])
            .unwrap_err();

        assert!(err.to_string().contains("cycle"));
        assert_eq!(store.len_of(ArtifactKind::ContentType), 0);
    }
}
