//! Render configuration
//!
//! Environment-level metadata written into the document header
//! (POWERMART, REPOSITORY and FOLDER elements). Everything has a default, so
//! a partial JSON file only needs the keys it wants to change.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{Attributes, Element};
use crate::error::Result;

const CREATION_DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// POWERMART element attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PowermartConfig {
    /// Captured once so that repeated renders are identical
    pub creation_date: String,
    pub repository_version: String,
}

impl Default for PowermartConfig {
    fn default() -> Self {
        Self {
            creation_date: chrono::Local::now()
                .format(CREATION_DATE_FORMAT)
                .to_string(),
            repository_version: "182.91".to_string(),
        }
    }
}

/// REPOSITORY element attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub name: String,
    pub version: String,
    pub codepage: String,
    pub database_type: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: "Dev_Repository".to_string(),
            version: "182".to_string(),
            codepage: "MS1252".to_string(),
            database_type: "Microsoft SQL Server".to_string(),
        }
    }
}

/// FOLDER element attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FolderConfig {
    pub name: String,
    pub group: String,
    pub owner: String,
    pub shared: String,
    pub description: String,
    pub permissions: String,
    pub uuid: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            name: "MAPPINGS".to_string(),
            group: String::new(),
            owner: "Administrator".to_string(),
            shared: "NOTSHARED".to_string(),
            description: String::new(),
            permissions: "rwx---r--".to_string(),
            uuid: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Everything the renderer needs besides the graph itself
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub powermart: PowermartConfig,
    pub repository: RepositoryConfig,
    pub folder: FolderConfig,
    /// Appended to the container kind ("Mapping", "Mapplet") to form the
    /// container DESCRIPTION when the graph has none
    pub description_suffix: String,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&content)?;
        log::info!("Loaded render config from {:?}", path.as_ref());
        Ok(config)
    }

    pub fn with_folder_name(mut self, name: impl Into<String>) -> Self {
        self.folder.name = name.into();
        self
    }

    pub fn with_creation_date(mut self, date: impl Into<String>) -> Self {
        self.powermart.creation_date = date.into();
        self
    }

    /// POWERMART > REPOSITORY > FOLDER wrapped around the folder children
    pub(crate) fn header(&self, folder_children: Vec<Element>) -> Element {
        let powermart = Attributes::new()
            .with("CREATION_DATE", self.powermart.creation_date.as_str())
            .with("REPOSITORY_VERSION", self.powermart.repository_version.as_str());
        let repository = Attributes::new()
            .with("NAME", self.repository.name.as_str())
            .with("VERSION", self.repository.version.as_str())
            .with("CODEPAGE", self.repository.codepage.as_str())
            .with("DATABASETYPE", self.repository.database_type.as_str());
        let folder = Attributes::new()
            .with("NAME", self.folder.name.as_str())
            .with("GROUP", self.folder.group.as_str())
            .with("OWNER", self.folder.owner.as_str())
            .with("SHARED", self.folder.shared.as_str())
            .with("DESCRIPTION", self.folder.description.as_str())
            .with("PERMISSIONS", self.folder.permissions.as_str())
            .with("UUID", self.folder.uuid.as_str());

        let mut folder = Element::with_attributes("FOLDER", folder);
        folder.children = folder_children;

        Element::with_attributes("POWERMART", powermart)
            .child(Element::with_attributes("REPOSITORY", repository).child(folder))
    }

    /// DESCRIPTION for a container element of the given kind
    pub(crate) fn container_description(&self, kind_title: &str) -> String {
        if self.description_suffix.is_empty() {
            String::new()
        } else {
            format!("{} {}", kind_title, self.description_suffix)
        }
    }
}
