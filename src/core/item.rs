use serde::{Deserialize, Serialize};

/// A record in the artifact catalog.
///
/// The catalog owns every field; search only reads the text fields and, during
/// reindex, writes `embedding`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub artisan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            materials: Vec::new(),
            artisan: String::new(),
            category: None,
            price: None,
            image_url: None,
            embedding: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_materials<I, S>(mut self, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.materials = materials.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_artisan(mut self, artisan: impl Into<String>) -> Self {
        self.artisan = artisan.into();
        self
    }

    /// The single text an item is embedded from: name, description, materials, artisan
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name,
            self.description,
            self.materials.join(" "),
            self.artisan
        )
    }
}
