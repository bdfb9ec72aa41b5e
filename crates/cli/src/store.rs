//! In-memory widget store backing the demo endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub tags: Vec<String>,
}

/// Body accepted by `POST /widgets`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWidget {
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct WidgetStore {
    widgets: RwLock<BTreeMap<Uuid, Widget>>,
}

impl WidgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, new: NewWidget) -> Widget {
        let widget = Widget {
            id: Uuid::new_v4(),
            name: new.name,
            quantity: new.quantity,
            tags: new.tags,
        };
        self.widgets
            .write()
            .await
            .insert(widget.id, widget.clone());
        widget
    }

    pub async fn get(&self, id: Uuid) -> Option<Widget> {
        self.widgets.read().await.get(&id).cloned()
    }

    /// All widgets, ordered by id.
    pub async fn list(&self) -> Vec<Widget> {
        self.widgets.read().await.values().cloned().collect()
    }

    pub async fn remove(&self, id: Uuid) -> Option<Widget> {
        self.widgets.write().await.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gear() -> NewWidget {
        NewWidget {
            name: "gear".to_string(),
            quantity: 3,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = WidgetStore::new();
        let widget = store.insert(gear()).await;

        assert_eq!(store.get(widget.id).await, Some(widget));
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = WidgetStore::new();
        let widget = store.insert(gear()).await;

        assert!(store.remove(widget.id).await.is_some());
        assert!(store.remove(widget.id).await.is_none());
        assert!(store.list().await.is_empty());
    }
}
