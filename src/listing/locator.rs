use crate::engine::AutomationEngine;
use crate::error::{EngineError, RowFault};
use async_trait::async_trait;

#[derive(Debug)]
pub enum LocateError {
    Missing(RowFault),
    Engine(EngineError),
}

impl From<EngineError> for LocateError {
    fn from(e: EngineError) -> Self {
        LocateError::Engine(e)
    }
}

/// Finds the element carrying a row's age indicator.
///
/// Keeps knowledge of where the listing places its metadata out of the row
/// parser.
#[async_trait(?Send)]
pub trait MetadataLocator<E: AutomationEngine> {
    async fn locate(&self, engine: &E, row: &E::Handle) -> Result<E::Handle, LocateError>;
}

/// Metadata lives in the row immediately following the title row
pub struct NextSiblingRow {
    age_selector: String,
}

impl NextSiblingRow {
    pub fn new(age_selector: impl Into<String>) -> Self {
        Self {
            age_selector: age_selector.into(),
        }
    }
}

#[async_trait(?Send)]
impl<E: AutomationEngine> MetadataLocator<E> for NextSiblingRow {
    async fn locate(&self, engine: &E, row: &E::Handle) -> Result<E::Handle, LocateError> {
        let meta = engine
            .next_sibling(row)
            .await?
            .ok_or(LocateError::Missing(RowFault::MissingMetadata))?;
        engine
            .query_within(&meta, &self.age_selector)
            .await?
            .ok_or(LocateError::Missing(RowFault::MissingAge))
    }
}
