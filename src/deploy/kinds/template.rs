use super::{invalid_key, key_from, verify_acyclic};
use crate::deploy::adapter::{KindAdapter, LinkContext};
use crate::deploy::error::StepError;
use crate::deploy::resolver::ReferenceResolver;
use crate::domain::{Artifact, ArtifactKey, IdError, Template};
use crate::manifest::TemplateDefinition;
use crate::storage::ArtifactStore;

/// Templates: keyed by alias, linked to their master template
pub struct TemplateAdapter<'s, S> {
    store: &'s S,
}

impl<'s, S> TemplateAdapter<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }
}

impl<'s, S> KindAdapter for TemplateAdapter<'s, S>
where
    S: ArtifactStore<Template>,
{
    type Definition = TemplateDefinition;
    type Artifact = Template;

    fn key(&self, definition: &TemplateDefinition) -> Result<ArtifactKey, IdError> {
        key_from(&definition.alias)
    }

    fn build(&self, definition: &TemplateDefinition) -> Result<Template, StepError> {
        let alias = self
            .key(definition)
            .map_err(|e| invalid_key::<Template>(&definition.alias, e))?;
        Ok(Template::new(
            definition.name.clone(),
            alias,
            definition.content.clone(),
        ))
    }

    fn link(
        &self,
        definition: &TemplateDefinition,
        template: &mut Template,
        links: &mut LinkContext,
    ) -> Result<bool, StepError> {
        let Some(master) = definition.master_template_alias.as_deref() else {
            return Ok(false);
        };

        let resolution = ReferenceResolver::<S, Template>::new(self.store).resolve_one(master)?;
        let master_id = links
            .accept(Template::KIND, &template.alias, "MasterTemplateAlias", resolution)?
            .into_iter()
            .next()
            .map(|r| r.id);

        if master_id.is_some() && master_id.as_ref() == template.id() {
            return Err(StepError::validation(
                Template::KIND,
                &template.alias,
                "a template cannot be its own master",
            ));
        }

        if master_id.is_none() || master_id == template.master_template {
            return Ok(false);
        }
        template.master_template = master_id;
        Ok(true)
    }

    fn verify(&self, linked: &[Template]) -> Result<(), StepError> {
        verify_acyclic(linked, |t| t.master_template.iter().collect())
    }
}
