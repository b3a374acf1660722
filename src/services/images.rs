// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race image storage: metadata rows in the database, bytes on disk under
//! `{upload_dir}/{race_id}/{uuid}.{ext}`.
//!
//! Constraints are checked before anything is written: at most 5 images
//! per race, 5 MB each, PNG/JPEG only.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::RaceImage;

const MAX_IMAGES_PER_RACE: i64 = 5;
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Clone)]
pub struct RaceImageStore {
    db: Database,
    root: PathBuf,
}

impl RaceImageStore {
    pub fn new(db: Database, root: PathBuf) -> Self {
        Self { db, root }
    }

    /// Validate and store an uploaded image for a race.
    pub async fn store(
        &self,
        race_id: i64,
        original_name: &str,
        content: &[u8],
    ) -> Result<RaceImage> {
        let count = self.db.count_race_images(race_id).await?;
        if count >= MAX_IMAGES_PER_RACE {
            return Err(AppError::Validation(format!(
                "A race can have at most {} images",
                MAX_IMAGES_PER_RACE
            )));
        }

        let ext = image_extension(original_name)?;

        if content.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(
                "Images must be 5MB or smaller".to_string(),
            ));
        }

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = self.race_dir(race_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Creating image dir: {}", e)))?;
        tokio::fs::write(dir.join(&filename), content)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Writing image: {}", e)))?;

        let image = self
            .db
            .insert_race_image(
                race_id,
                &filename,
                original_name,
                chrono::Utc::now().naive_utc(),
            )
            .await?;

        tracing::info!(
            race_id,
            image_id = image.id,
            size = content.len(),
            "Race image stored"
        );
        Ok(image)
    }

    /// Delete one image: row first, then the file (best effort).
    pub async fn remove(&self, image: &RaceImage) -> Result<()> {
        self.db.delete_race_image(image.race_id, image.id).await?;
        let path = self.file_path(image.race_id, &image.filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove image file");
        }
        Ok(())
    }

    /// Remove the files of an already-deleted race's images, then its
    /// directory if empty.
    pub async fn remove_files(&self, race_id: i64, images: &[RaceImage]) {
        for image in images {
            let path = self.file_path(race_id, &image.filename);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove image file");
            }
        }
        let _ = tokio::fs::remove_dir(self.race_dir(race_id)).await;
    }

    pub fn file_path(&self, race_id: i64, filename: &str) -> PathBuf {
        self.race_dir(race_id).join(filename)
    }

    fn race_dir(&self, race_id: i64) -> PathBuf {
        self.root.join(race_id.to_string())
    }
}

/// Lowercased extension if the name carries an allowed image extension.
fn image_extension(original_name: &str) -> Result<String> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(AppError::Validation(
            "Only PNG, JPG and JPEG images can be uploaded".to_string(),
        )),
    }
}

/// MIME type for a stored image filename, by extension.
pub fn content_type_for(filename: &str) -> &'static str {
    match Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}
