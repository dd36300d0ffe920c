// ABOUTME: Source image batch jobs: copy-all, delete-all and mass upload.
// ABOUTME: Wires the API client into the batch engine's lister, counter and operation seams.

use crate::batch::{
    BatchJob, BatchOptions, BoxError, Counter, FilesystemScanner, Operation, OperationOutcome,
    Page, PageLister, RemoteListingScanner,
};
use crate::client::{Client, ListOptions};
use crate::types::{Organization, WorkItem};
use async_trait::async_trait;
use bytes::Bytes;
use nonempty::NonEmpty;
use std::path::{Path, PathBuf};

/// Hashes per bulk copy request.
pub const COPY_GROUP_SIZE: usize = 100;
/// The API has no bulk delete.
pub const DELETE_GROUP_SIZE: usize = 1;
pub const UPLOAD_GROUP_SIZE: usize = 100;

/// Lists every source image hash of an organization.
#[derive(Debug, Clone)]
pub struct SourceImagesLister {
    organization: Organization,
}

impl SourceImagesLister {
    pub fn new(organization: Organization) -> Self {
        Self { organization }
    }
}

#[async_trait]
impl PageLister<Client> for SourceImagesLister {
    async fn list_page(&self, client: &Client, cursor: &str) -> Result<Page, BoxError> {
        let options = ListOptions::default().offset(cursor);
        let response = client
            .list_source_images(&self.organization, &options)
            .await?;

        Ok(Page {
            items: response
                .items
                .into_iter()
                .map(|image| WorkItem::new(image.hash))
                .collect(),
            cursor: response.cursor.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Counter<Client> for SourceImagesLister {
    /// Fetch a single image to learn the total.
    async fn count(&self, client: &Client) -> Result<u64, BoxError> {
        let options = ListOptions::default().limit(1);
        let response = client
            .list_source_images(&self.organization, &options)
            .await?;
        Ok(response.total)
    }
}

/// Copies groups of hashes to another organization with the bulk copy API.
#[derive(Debug, Clone)]
pub struct CopyAll {
    source: Organization,
    destination: Organization,
}

impl CopyAll {
    pub fn new(source: Organization, destination: Organization) -> Self {
        Self {
            source,
            destination,
        }
    }
}

#[async_trait]
impl Operation<Client> for CopyAll {
    async fn apply(
        &self,
        client: &Client,
        items: &[WorkItem],
        _options: &BatchOptions,
    ) -> OperationOutcome {
        let hashes: Vec<&str> = items.iter().map(WorkItem::as_str).collect();

        match client
            .copy_source_images(&self.source, &hashes, &self.destination)
            .await
        {
            Ok(response) => {
                let ok = response.copied(hashes.len());
                OperationOutcome {
                    ok,
                    not_ok: hashes.len() - ok,
                    error: None,
                }
            }
            Err(e) => OperationOutcome::failed(hashes.len(), e),
        }
    }
}

/// Deletes source images one by one.
#[derive(Debug, Clone)]
pub struct DeleteAll {
    organization: Organization,
}

impl DeleteAll {
    pub fn new(organization: Organization) -> Self {
        Self { organization }
    }
}

#[async_trait]
impl Operation<Client> for DeleteAll {
    async fn apply(
        &self,
        client: &Client,
        items: &[WorkItem],
        _options: &BatchOptions,
    ) -> OperationOutcome {
        let mut outcome = OperationOutcome::default();
        for hash in items {
            outcome.record(
                client
                    .delete_source_image(&self.organization, hash.as_str())
                    .await,
            );
        }
        outcome
    }
}

/// Uploads local files as new source images.
#[derive(Debug, Clone)]
pub struct MassUpload {
    organization: Organization,
}

impl MassUpload {
    pub fn new(organization: Organization) -> Self {
        Self { organization }
    }

    async fn upload(&self, client: &Client, path: &Path) -> Result<(), BoxError> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let response = client
            .create_source_image(&self.organization, &file_name, Bytes::from(data))
            .await?;
        if let Some(image) = response.items.first() {
            tracing::debug!("uploaded {} as {}", path.display(), image.hash);
        }
        Ok(())
    }
}

#[async_trait]
impl Operation<Client> for MassUpload {
    async fn apply(
        &self,
        client: &Client,
        items: &[WorkItem],
        _options: &BatchOptions,
    ) -> OperationOutcome {
        let mut outcome = OperationOutcome::default();
        for path in items {
            let result = self.upload(client, Path::new(path.as_str())).await;
            if let Err(e) = &result {
                tracing::warn!("failed to upload {}: {}", path, e);
            }
            outcome.record(result);
        }
        outcome
    }
}

/// Copy every source image of `source` into `destination`.
pub fn copy_all_job(source: Organization, destination: Organization) -> BatchJob<Client> {
    let message = format!("from organization {source} to {destination}");
    let lister = SourceImagesLister::new(source.clone());

    BatchJob::new(
        RemoteListingScanner::new(lister.clone()),
        CopyAll::new(source, destination),
        COPY_GROUP_SIZE,
    )
    .counter(lister)
    .message(move |total| match total {
        Some(total) => format!("Copying of {total} source images {message}"),
        None => format!("Copying of source images {message}"),
    })
}

/// Delete every source image of `organization`.
pub fn delete_all_job(organization: Organization) -> BatchJob<Client> {
    let lister = SourceImagesLister::new(organization.clone());
    let name = organization.to_string();

    BatchJob::new(
        RemoteListingScanner::new(lister.clone()),
        DeleteAll::new(organization),
        DELETE_GROUP_SIZE,
    )
    .counter(lister)
    .message(move |total| match total {
        Some(total) => format!("Deleting of {total} source images on organization {name}."),
        None => format!("Deleting of source images on organization {name}."),
    })
}

/// Upload the images found under `root`.
pub fn mass_upload_job(
    organization: Organization,
    root: PathBuf,
    recursive: bool,
    extensions: NonEmpty<String>,
) -> BatchJob<Client> {
    let message = format!(
        "Uploading images from directory `{}` to organization `{}`.",
        root.display(),
        organization
    );

    BatchJob::new(
        FilesystemScanner::new(root, recursive, extensions),
        MassUpload::new(organization),
        UPLOAD_GROUP_SIZE,
    )
    .message(move |_| message.clone())
}
