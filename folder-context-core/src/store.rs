//! Session-local history of contexts and the "what is on screen" state.

use chrono::Utc;
use tracing::{debug, info};

use crate::contract::{Context, PipelineError};

/// Newest-first collection of contexts. Ids are unique and strictly increasing.
#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: Vec<Context>,
    last_id: u64,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: the current time in milliseconds, bumped past the last id handed out.
    pub fn next_id(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last_id.saturating_add(1));
        self.last_id = id;
        id
    }

    /// Prepend a context. Rejects an id that is already present.
    pub fn create(&mut self, context: Context) -> Result<(), PipelineError> {
        if self.contexts.iter().any(|c| c.id == context.id) {
            return Err(PipelineError::DuplicateContext(context.id));
        }
        self.last_id = self.last_id.max(context.id);
        info!(
            context_id = context.id,
            name = %context.name,
            files = context.file_count,
            "Stored context"
        );
        self.contexts.insert(0, context);
        Ok(())
    }

    pub fn select(&self, id: u64) -> Option<&Context> {
        self.contexts.iter().find(|c| c.id == id)
    }

    pub fn delete(&mut self, id: u64) -> Option<Context> {
        let index = self.contexts.iter().position(|c| c.id == id)?;
        debug!(context_id = id, "Deleting context");
        Some(self.contexts.remove(index))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter()
    }

    /// The whole history as pretty JSON, newest first.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.contexts)
    }
}

/// Which context, if any, is being viewed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Empty,
    Viewing(u64),
}

impl ViewState {
    pub fn active_id(&self) -> Option<u64> {
        match self {
            ViewState::Empty => None,
            ViewState::Viewing(id) => Some(*id),
        }
    }

    /// Apply the deletion of `id`. Returns true when the active context was deleted.
    pub fn on_deleted(&mut self, id: u64) -> bool {
        if self.active_id() == Some(id) {
            *self = ViewState::Empty;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(id: u64, name: &str) -> Context {
        Context {
            id,
            name: name.to_string(),
            timestamp: Utc::now(),
            file_count: 1,
            content: format!("content of {name}"),
            filters: String::new(),
        }
    }

    #[test]
    fn create_prepends() {
        let mut store = ContextStore::new();
        store.create(context(1, "first")).unwrap();
        store.create(context(2, "second")).unwrap();
        let names: Vec<_> = store.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = ContextStore::new();
        store.create(context(5, "a")).unwrap();
        let err = store.create(context(5, "b")).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateContext(5)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_strictly_increase_even_back_to_back() {
        let mut store = ContextStore::new();
        let ids: Vec<u64> = (0..50).map(|_| store.next_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn next_id_skips_past_stored_ids() {
        let mut store = ContextStore::new();
        store.create(context(u64::MAX - 10, "far future")).unwrap();
        assert_eq!(store.next_id(), u64::MAX - 9);
    }

    #[test]
    fn select_and_delete_by_id() {
        let mut store = ContextStore::new();
        store.create(context(1, "a")).unwrap();
        store.create(context(2, "b")).unwrap();
        assert_eq!(store.select(1).map(|c| c.name.as_str()), Some("a"));
        assert!(store.select(3).is_none());
        assert_eq!(store.delete(1).map(|c| c.name), Some("a".to_string()));
        assert!(store.delete(1).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn deleting_the_viewed_context_empties_the_view() {
        let mut view = ViewState::Viewing(4);
        assert!(!view.on_deleted(3));
        assert_eq!(view, ViewState::Viewing(4));
        assert!(view.on_deleted(4));
        assert_eq!(view, ViewState::Empty);
    }

    #[test]
    fn export_is_newest_first_json() {
        let mut store = ContextStore::new();
        store.create(context(1, "a")).unwrap();
        store.create(context(2, "b")).unwrap();
        let json = store.export_json().unwrap();
        let parsed: Vec<Context> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1]);
    }
}
