//! In-process stores with the same semantics as the PostgreSQL ones.
//!
//! Each sweet lives in its own mutex slot, so stock changes on one record
//! serialize while different records proceed independently. The outer map
//! lock is only held to look a slot up, insert or remove it.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::StoreError,
    sweets::{
        repo::SweetStore,
        repo_types::{NewSweet, Sweet, SweetPatch},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    by_email: RwLock<HashMap<String, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.by_email.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.by_email.read().await;
        Ok(users.values().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.by_email.write().await;
        if users.contains_key(&new.email) {
            return Err(StoreError::Conflict("Email already in use".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }
}

struct Slot {
    sweet: Sweet,
    removed: bool,
}

#[derive(Default)]
pub struct MemorySweetStore {
    rows: RwLock<HashMap<Uuid, Arc<Mutex<Slot>>>>,
}

impl MemorySweetStore {
    async fn slot(&self, id: Uuid) -> Result<Arc<Mutex<Slot>>, StoreError> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Runs `f` on a copy of the row under its lock and stores the copy only
    /// if `f` succeeds.
    async fn modify<F>(&self, id: Uuid, f: F) -> Result<Sweet, StoreError>
    where
        F: FnOnce(&mut Sweet) -> Result<(), StoreError> + Send,
    {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        if guard.removed {
            return Err(StoreError::NotFound);
        }
        let mut next = guard.sweet.clone();
        f(&mut next)?;
        guard.sweet = next;
        Ok(guard.sweet.clone())
    }

    async fn collect<P>(&self, keep: P) -> Vec<Sweet>
    where
        P: Fn(&Sweet) -> bool + Send,
    {
        let slots: Vec<_> = self.rows.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            let guard = slot.lock().await;
            if !guard.removed && keep(&guard.sweet) {
                out.push(guard.sweet.clone());
            }
        }
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        out
    }
}

#[async_trait]
impl SweetStore for MemorySweetStore {
    async fn insert(&self, new: NewSweet) -> Result<Sweet, StoreError> {
        let sweet = Sweet {
            id: Uuid::new_v4(),
            name: new.name,
            category: new.category,
            price: new.price,
            quantity: new.quantity,
            image_url: new.image_url,
            created_at: OffsetDateTime::now_utc(),
        };
        let slot = Slot {
            sweet: sweet.clone(),
            removed: false,
        };
        self.rows
            .write()
            .await
            .insert(sweet.id, Arc::new(Mutex::new(slot)));
        Ok(sweet)
    }

    async fn list(&self) -> Result<Vec<Sweet>, StoreError> {
        Ok(self.collect(|_| true).await)
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Sweet>, StoreError> {
        Ok(self.collect(|s| s.category == category).await)
    }

    async fn search(&self, query: &str) -> Result<Vec<Sweet>, StoreError> {
        let needle = query.to_lowercase();
        Ok(self
            .collect(|s| {
                s.name.to_lowercase().contains(&needle) || s.category.to_lowercase().contains(&needle)
            })
            .await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Sweet>, StoreError> {
        let Ok(slot) = self.slot(id).await else {
            return Ok(None);
        };
        let guard = slot.lock().await;
        Ok((!guard.removed).then(|| guard.sweet.clone()))
    }

    async fn update(&self, id: Uuid, patch: SweetPatch) -> Result<Sweet, StoreError> {
        self.modify(id, move |s| {
            patch.apply(s);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<Sweet, StoreError> {
        let slot = self
            .rows
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::NotFound)?;
        let mut guard = slot.lock().await;
        guard.removed = true;
        Ok(guard.sweet.clone())
    }

    async fn purchase(&self, id: Uuid) -> Result<Sweet, StoreError> {
        self.modify(id, |s| {
            if s.quantity <= 0 {
                return Err(StoreError::OutOfStock);
            }
            s.quantity -= 1;
            Ok(())
        })
        .await
    }

    async fn restock(&self, id: Uuid, amount: i32) -> Result<Sweet, StoreError> {
        self.modify(id, move |s| {
            s.quantity = s
                .quantity
                .checked_add(amount)
                .ok_or_else(|| StoreError::Invalid("Restock would overflow quantity".into()))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use rust_decimal::Decimal;

    fn new_sweet(name: &str, quantity: i32) -> NewSweet {
        NewSweet {
            name: name.into(),
            category: "Test".into(),
            price: Decimal::ONE,
            quantity,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn user_email_is_unique() {
        let users = MemoryUserStore::default();
        let new = NewUser {
            email: "a@b.co".into(),
            password_hash: "h".into(),
            role: Role::User,
        };
        let created = users.create(new.clone()).await.unwrap();
        assert!(matches!(users.create(new).await, Err(StoreError::Conflict(_))));
        let by_id = users.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@b.co");
    }

    #[tokio::test]
    async fn list_is_ordered_by_creation() {
        let store = MemorySweetStore::default();
        let a = store.insert(new_sweet("a", 1)).await.unwrap();
        let b = store.insert(new_sweet("b", 1)).await.unwrap();
        let c = store.insert(new_sweet("c", 1)).await.unwrap();
        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
        let mut expected = vec![a, b, c];
        expected.sort_by(|x, y| x.created_at.cmp(&y.created_at).then(x.id.cmp(&y.id)));
        assert_eq!(ids, expected.into_iter().map(|s| s.id).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn failed_mutation_leaves_row_untouched() {
        let store = MemorySweetStore::default();
        let s = store.insert(new_sweet("x", i32::MAX)).await.unwrap();
        assert!(matches!(store.restock(s.id, 1).await, Err(StoreError::Invalid(_))));
        assert_eq!(store.get(s.id).await.unwrap().unwrap().quantity, i32::MAX);
    }

    #[tokio::test]
    async fn deleted_rows_disappear_everywhere() {
        let store = MemorySweetStore::default();
        let s = store.insert(new_sweet("gone", 3)).await.unwrap();
        store.delete(s.id).await.unwrap();
        assert!(store.get(s.id).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(store.purchase(s.id).await, Err(StoreError::NotFound)));
        assert!(matches!(store.delete(s.id).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn search_treats_metacharacters_literally() {
        let store = MemorySweetStore::default();
        store.insert(new_sweet("100% Cocoa", 1)).await.unwrap();
        store.insert(new_sweet("Toffee", 1)).await.unwrap();
        assert_eq!(store.search("0% c").await.unwrap().len(), 1);
        assert_eq!(store.search("_").await.unwrap().len(), 0);
    }
}
