use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;

use crate::error::SurfaceError;

/// One way of reading a value off the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extraction {
    Text(&'static str),
    NestedText {
        outer: &'static str,
        inner: &'static str,
    },
    Href(&'static str),
    PageUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingField {
    Name,
    Category,
    Address,
    Phone,
    Website,
    SourceUrl,
}

/// Strategies for one field, tried in order until one yields a non-empty value.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: ListingField,
    pub chain: &'static [Extraction],
}

pub type ExtractedFields = HashMap<ListingField, String>;

/// The subset of a browser page the scraper is allowed to drive.
#[async_trait]
pub trait RenderingSurface: Send {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SurfaceError>;

    /// `Ok(false)` when the selector did not show up before the timeout.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, SurfaceError>;

    async fn click_first(&mut self, selector: &str) -> Result<bool, SurfaceError>;

    async fn scroll_to_end(&mut self, container: &str) -> Result<(), SurfaceError>;

    async fn is_present(&mut self, selector: &str) -> Result<bool, SurfaceError>;

    async fn is_scrolled_to_bottom(&mut self, container: &str) -> Result<bool, SurfaceError>;

    async fn collect_links(&mut self, selector: &str) -> Result<Vec<String>, SurfaceError>;

    async fn read(&mut self, extraction: &Extraction) -> Result<Option<String>, SurfaceError>;

    async fn extract_first(
        &mut self,
        chain: &[Extraction],
    ) -> Result<Option<String>, SurfaceError> {
        for extraction in chain {
            if let Some(value) = self.read(extraction).await? {
                let value = value.trim();
                if !value.is_empty() {
                    return Ok(Some(value.to_string()));
                }
            }
        }
        Ok(None)
    }

    async fn extract_fields(&mut self, specs: &[FieldSpec]) -> Result<ExtractedFields, SurfaceError> {
        let mut fields = HashMap::new();
        for spec in specs {
            if let Some(value) = self.extract_first(spec.chain).await? {
                fields.insert(spec.field, value);
            }
        }
        Ok(fields)
    }

    async fn close(&mut self);
}

/// Opens a fresh rendering surface for each extraction run.
#[async_trait]
pub trait SurfaceLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn RenderingSurface>, SurfaceError>;
}
