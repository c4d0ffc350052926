use crate::models::descriptor::{DependencyRecord, ModManifest, ModSide};
use crate::models::error::ModError;
use crate::utils::id::sanitize_mod_id;
use crate::utils::json_doc::JsonDoc;
use serde_json::Value;

const UTF8_BOM: char = '\u{feff}';

/// Parses `modinfo.json` documents into [`ModManifest`] values.
#[derive(Clone, Debug, Default)]
pub struct ManifestParser {
    /// Token used to pick an entry from a manifest's `versionmap`, e.g. `1.21`.
    target_version: Option<String>,
}

impl ManifestParser {
    pub fn new(target_version: Option<String>) -> Self {
        Self {
            target_version: target_version.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Parses a manifest document. `fallback_name` is used when the manifest
    /// has no `name`, and to derive the mod id when it has no `modid`.
    pub fn parse(&self, json: &str, fallback_name: &str) -> Result<ModManifest, ModError> {
        let value: Value = serde_json::from_str(json.trim_start_matches(UTF8_BOM))
            .map_err(|e| ModError::ParseError(format!("Invalid manifest: {e}")))?;
        let doc = JsonDoc::from_value(&value)
            .ok_or_else(|| ModError::ParseError("Manifest is not a JSON object".into()))?;

        let name = doc
            .get_str(&["name"])
            .unwrap_or_else(|| fallback_name.to_string());
        let mod_id = doc
            .get_str(&["modid", "id"])
            .unwrap_or_else(|| sanitize_mod_id(&name));

        Ok(ModManifest {
            mod_id,
            version: self.resolve_version(&doc),
            network_version: doc.get_str(&["networkversion"]),
            description: doc.get_str(&["description"]).unwrap_or_default(),
            website: doc.get_str(&["website"]).unwrap_or_default(),
            authors: doc.get_string_list(&["authors", "author"]),
            contributors: doc.get_string_list(&["contributors", "contributor"]),
            dependencies: Self::read_dependencies(&doc),
            icon_path: doc.get_str(&["iconpath"]),
            side: doc.get_str(&["side"]).as_deref().and_then(ModSide::parse),
            required_on_client: doc.get_bool(&["requiredonclient"]),
            required_on_server: doc.get_bool(&["requiredonserver"]),
            name,
        })
    }

    /// `version` wins; otherwise the `versionmap` entry whose key contains the
    /// target token, otherwise the map's last entry.
    fn resolve_version(&self, doc: &JsonDoc) -> Option<String> {
        if let Some(v) = doc.get_str(&["version"]) {
            return Some(v);
        }

        let map = doc.get_object(&["versionmap"])?;
        let as_version = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        self.target_version
            .as_deref()
            .and_then(|token| {
                map.iter()
                    .find(|(k, _)| k.contains(token))
                    .and_then(|(_, v)| as_version(v))
            })
            .or_else(|| map.values().last().and_then(as_version))
    }

    fn read_dependencies(doc: &JsonDoc) -> Vec<DependencyRecord> {
        let Some(deps) = doc.get_object(&["dependencies", "depends"]) else {
            return Vec::new();
        };

        deps.iter()
            .filter(|(id, _)| !id.trim().is_empty())
            .map(|(id, version)| {
                let version = version.as_str().map(str::trim).unwrap_or_default();
                DependencyRecord::new(id.trim(), version)
            })
            .collect()
    }
}
