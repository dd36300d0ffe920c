// ABOUTME: Source image endpoints: list, get, delete, bulk copy and upload.
// ABOUTME: Response types keep only the fields the batch commands read or print.

use super::{Client, ClientError};
use crate::transport::{FormPart, RequestBody};
use crate::types::Organization;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::Method;
use serde::{Deserialize, Serialize};

/// One stored source image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceImage {
    pub hash: String,
    pub short_hash: String,
    pub binary_hash: String,
    pub name: String,
    #[serde(rename = "mimetype")]
    pub mime_type: String,
    pub format: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub organization: String,
    pub link: String,
    pub created: Option<DateTime<Utc>>,
}

/// Page of source images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSourceImagesResponse {
    pub total: u64,
    pub items: Vec<SourceImage>,
    /// Offset of the next page. Absent or empty on the last page.
    pub cursor: Option<String>,
}

/// Paging parameters for [`Client::list_source_images`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: Option<u32>,
    /// Cursor returned by the previous page.
    pub offset: Option<String>,
}

impl ListOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: impl Into<String>) -> Self {
        let offset = offset.into();
        self.offset = (!offset.is_empty()).then_some(offset);
        self
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = &self.offset {
            query.push(("offset", offset.clone()));
        }
        query
    }
}

/// Result of a bulk copy. Both lists hold hashes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyResponse {
    /// Already present in the destination.
    pub existing: Vec<String>,
    /// Newly copied.
    pub created: Vec<String>,
}

impl CopyResponse {
    /// Hashes that ended up in the destination, capped at `requested`.
    pub fn copied(&self, requested: usize) -> usize {
        (self.existing.len() + self.created.len()).min(requested)
    }
}

fn collection_path(org: &Organization) -> String {
    format!("/sourceimages/{}", urlencoding::encode(org.as_str()))
}

fn item_path(org: &Organization, hash: &str) -> String {
    format!("{}/{}", collection_path(org), urlencoding::encode(hash))
}

impl Client {
    pub async fn list_source_images(
        &self,
        org: &Organization,
        options: &ListOptions,
    ) -> Result<ListSourceImagesResponse, ClientError> {
        let request = self.request(
            Method::GET,
            &collection_path(org),
            &options.query(),
            &[],
            RequestBody::Empty,
        )?;
        self.call(request).await
    }

    pub async fn get_source_image(
        &self,
        org: &Organization,
        hash: &str,
    ) -> Result<SourceImage, ClientError> {
        let request = self.request(
            Method::GET,
            &item_path(org, hash),
            &[],
            &[],
            RequestBody::Empty,
        )?;
        self.call(request).await
    }

    pub async fn delete_source_image(
        &self,
        org: &Organization,
        hash: &str,
    ) -> Result<(), ClientError> {
        let request = self.request(
            Method::DELETE,
            &item_path(org, hash),
            &[],
            &[],
            RequestBody::Empty,
        )?;
        self.execute(request).await?;
        Ok(())
    }

    /// Copy source images to another organization in one request.
    pub async fn copy_source_images(
        &self,
        org: &Organization,
        hashes: &[&str],
        destination: &Organization,
    ) -> Result<CopyResponse, ClientError> {
        let path = format!("{}/copy", collection_path(org));
        let request = self.request(
            Method::POST,
            &path,
            &[],
            &[("Destination", destination.as_str())],
            RequestBody::json(hashes)?,
        )?;
        self.call(request).await
    }

    /// Upload one file as a new source image.
    pub async fn create_source_image(
        &self,
        org: &Organization,
        file_name: &str,
        data: Bytes,
    ) -> Result<ListSourceImagesResponse, ClientError> {
        let body = RequestBody::Multipart(vec![FormPart::file("filedata", file_name, data)]);
        let request = self.request(Method::POST, &collection_path(org), &[], &[], body)?;
        self.call(request).await
    }
}
