//! Catalog configuration

/// Upload limits and listing defaults.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Largest accepted upload in bytes
    pub max_file_size: usize,
    /// Lowercase extensions without the dot
    pub allowed_file_types: Vec<String>,
    pub default_currency: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            allowed_file_types: ["pdf", "zip", "epub", "mp3", "mp4", "png", "jpg", "jpeg"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_currency: "NGN".to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn allows_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_file_types.iter().any(|allowed| *allowed == ext)
    }
}
