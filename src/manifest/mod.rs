//! # Manifests
//!
//! The configuration source: turns a YAML/JSON/TOML document into ordered
//! artifact definitions, one section per kind.
//!
//! ```yaml
//! Templates:
//!   - Name: Master
//!     Alias: master
//!     Content: "<html>@RenderBody()</html>"
//! ContentTypes:
//!   - Name: Home Page
//!     Alias: homePage
//!     DefaultTemplate: master
//!     AllowedContentTypes: "textPage,newsPage"
//! ```

mod definition;
mod loader;

pub use definition::{
    ContentTypeDefinition, DataTypeDefinition, MacroDefinition, MacroPropertyDefinition,
    PartialViewDefinition, PreValueDefinition, PropertyDefinition, ScriptDefinition,
    StylesheetDefinition, TemplateDefinition,
};
pub use loader::{Manifest, ManifestError, ManifestFormat};
