//! Client side of the resource API: a cached copy of the list with local
//! search, filter and sort, kept in step with the server after each
//! mutation.

mod cache;
mod query;

pub use cache::{LoadState, Mutation, ResourceCache, ResourceSummary};
pub use query::{compare_titles, filter_and_sort, BrowseQuery, SortKey, SortOrder, SortSpec};

use crate::application::CreateResourceRequest;
use crate::domain::{Resource, ResourceFilter};
use crate::infrastructure::api_client::{ClientError, ResourceApiClient, UploadFile};
use tracing::{debug, error};

pub struct ResourceBrowser {
    client: ResourceApiClient,
    cache: ResourceCache,
}

impl ResourceBrowser {
    pub fn new(client: ResourceApiClient) -> Self {
        Self {
            client,
            cache: ResourceCache::new(),
        }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn client_mut(&mut self) -> &mut ResourceApiClient {
        &mut self.client
    }

    /// Replaces the cached list with the server's full list.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.cache.begin_load();
        match self.client.fetch_resources(&ResourceFilter::default()).await {
            Ok(response) => {
                debug!(count = response.total_count, "Fetched resources");
                self.cache.finish_load(Ok(response.resources));
                Ok(())
            }
            Err(e) => {
                error!("Error fetching resources: {}", e);
                self.cache.finish_load(Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// Fetches only when the cache is idle or the last load failed.
    pub async fn ensure_loaded(&mut self) -> Result<(), ClientError> {
        if self.cache.needs_fetch() {
            self.refresh().await?;
        }
        Ok(())
    }

    pub fn view(&self, query: &BrowseQuery, sort: SortSpec) -> Vec<Resource> {
        self.cache.view(query, sort)
    }

    pub async fn upload(
        &mut self,
        file: &UploadFile,
        metadata: &CreateResourceRequest,
    ) -> Result<Resource, ClientError> {
        let resource = self.client.upload(file, metadata).await.map_err(|e| {
            error!("Error uploading resource: {}", e);
            e
        })?;

        self.cache.apply(Mutation::Created(resource.clone()));
        Ok(resource)
    }

    pub async fn download(&mut self, id: &str) -> Result<Vec<u8>, ClientError> {
        let bytes = self.client.download(id).await.map_err(|e| {
            error!("Error downloading resource {}: {}", id, e);
            e
        })?;

        self.cache.apply(Mutation::Downloaded(id.to_string()));
        Ok(bytes)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        self.client.delete(id).await.map_err(|e| {
            error!("Error deleting resource {}: {}", id, e);
            e
        })?;

        self.cache.apply(Mutation::Deleted(id.to_string()));
        Ok(())
    }
}
