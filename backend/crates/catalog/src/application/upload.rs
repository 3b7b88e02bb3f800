//! Product file uploads
//!
//! The downloadable file goes to storage as a raw asset, the thumbnail as an
//! image. Every part is checked before anything is uploaded.

use std::path::Path;
use std::sync::Arc;

use auth::CurrentUser;
use chrono::Utc;
use kernel::id::ProductId;
use platform::storage::{ObjectStorage, ResourceKind};

use crate::application::config::CatalogConfig;
use crate::application::product::{owned_product, remove_stored};
use crate::domain::entity::{Product, StoredFile};
use crate::domain::repository::ProductRepository;
use crate::error::{CatalogError, CatalogResult};

/// Which multipart field a part arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    File,
    Thumbnail,
}

impl FileSlot {
    pub fn from_field(name: &str) -> Option<Self> {
        match name {
            "file" => Some(FileSlot::File),
            "thumbnail" => Some(FileSlot::Thumbnail),
            _ => None,
        }
    }

    fn resource_kind(&self) -> ResourceKind {
        match self {
            FileSlot::File => ResourceKind::Raw,
            FileSlot::Thumbnail => ResourceKind::Image,
        }
    }

    fn folder(&self) -> &'static str {
        match self {
            FileSlot::File => "products/files",
            FileSlot::Thumbnail => "products/thumbnails",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub slot: FileSlot,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Size and type rules. Thumbnails must also be images.
    pub fn check(&self, config: &CatalogConfig) -> CatalogResult<String> {
        if self.bytes.is_empty() {
            return Err(CatalogError::MissingFile);
        }
        if self.bytes.len() > config.max_file_size {
            return Err(CatalogError::FileTooLarge {
                max: config.max_file_size,
            });
        }
        let ext = self
            .extension()
            .ok_or_else(|| CatalogError::FileTypeNotAllowed(String::new()))?;
        if !config.allows_extension(&ext) {
            return Err(CatalogError::FileTypeNotAllowed(ext));
        }
        if self.slot == FileSlot::Thumbnail && ResourceKind::for_extension(&ext) != ResourceKind::Image
        {
            return Err(CatalogError::FileTypeNotAllowed(ext));
        }
        Ok(ext)
    }
}

pub struct UploadProductFilesUseCase<P>
where
    P: ProductRepository,
{
    products: Arc<P>,
    storage: ObjectStorage,
    config: Arc<CatalogConfig>,
}

impl<P> UploadProductFilesUseCase<P>
where
    P: ProductRepository,
{
    pub fn new(products: Arc<P>, storage: ObjectStorage, config: Arc<CatalogConfig>) -> Self {
        Self {
            products,
            storage,
            config,
        }
    }

    pub async fn execute(
        &self,
        user: &CurrentUser,
        id: &ProductId,
        files: Vec<UploadedFile>,
    ) -> CatalogResult<Product> {
        if files.is_empty() {
            return Err(CatalogError::MissingFile);
        }
        let mut product = owned_product(&*self.products, id, user).await?;
        let checked = files
            .into_iter()
            .map(|file| file.check(&self.config).map(|ext| (file, ext)))
            .collect::<CatalogResult<Vec<_>>>()?;

        let mut replaced = Vec::new();
        for (file, ext) in checked {
            let size = file.bytes.len() as i64;
            let stored = self
                .storage
                .upload(file.bytes, &file.file_name, file.slot.resource_kind(), file.slot.folder())
                .await?;
            let stored_file = StoredFile {
                url: stored.secure_url,
                public_id: stored.public_id,
            };
            let now = Utc::now();
            let previous = match file.slot {
                FileSlot::File => product.attach_file(stored_file, file.file_name, size, ext, now),
                FileSlot::Thumbnail => product.attach_thumbnail(stored_file, now),
            };
            if let Some(previous) = previous {
                replaced.push((previous, file.slot.resource_kind()));
            }
        }

        self.products.update_product(&product).await?;
        for (previous, kind) in &replaced {
            remove_stored(&self.storage, previous, *kind).await;
        }

        tracing::info!(product_id = %id, replaced = replaced.len(), "Product files uploaded");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(slot: FileSlot, name: &str, len: usize) -> UploadedFile {
        UploadedFile {
            slot,
            file_name: name.to_string(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn test_file_checks() {
        let config = CatalogConfig {
            max_file_size: 100,
            ..CatalogConfig::default()
        };

        assert_eq!(upload(FileSlot::File, "Book.PDF", 10).check(&config).unwrap(), "pdf");
        assert!(matches!(
            upload(FileSlot::File, "book.pdf", 101).check(&config),
            Err(CatalogError::FileTooLarge { max: 100 })
        ));
        assert!(matches!(
            upload(FileSlot::File, "setup.exe", 10).check(&config),
            Err(CatalogError::FileTypeNotAllowed(ext)) if ext == "exe"
        ));
        assert!(matches!(
            upload(FileSlot::File, "README", 10).check(&config),
            Err(CatalogError::FileTypeNotAllowed(_))
        ));
        assert!(matches!(
            upload(FileSlot::File, "empty.pdf", 0).check(&config),
            Err(CatalogError::MissingFile)
        ));
    }

    #[test]
    fn test_thumbnail_must_be_image() {
        let config = CatalogConfig::default();
        assert!(upload(FileSlot::Thumbnail, "cover.jpg", 10).check(&config).is_ok());
        assert!(upload(FileSlot::Thumbnail, "cover.pdf", 10).check(&config).is_err());
    }

    #[test]
    fn test_slot_fields() {
        assert_eq!(FileSlot::from_field("file"), Some(FileSlot::File));
        assert_eq!(FileSlot::from_field("thumbnail"), Some(FileSlot::Thumbnail));
        assert_eq!(FileSlot::from_field("avatar"), None);
    }
}
