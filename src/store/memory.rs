//! In-memory product store used by tests

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;

use super::{NewProduct, Product, ProductStore, StoreError};

#[derive(Default)]
struct Rows {
    products: Vec<Product>,
    next_id: i64,
}

/// Mirrors the Postgres store semantics without a database
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Rows>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails like a lost connection
    pub fn failing() -> Self {
        Self {
            rows: Mutex::default(),
            failing: true,
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        } else {
            Ok(())
        }
    }
}

fn newest_first(products: &mut [Product]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        self.check()?;
        let mut products = self.rows.lock().unwrap().products.clone();
        newest_first(&mut products);
        Ok(products)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, product: &NewProduct) -> Result<i64, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        rows.next_id += 1;
        let id = rows.next_id;
        // Strictly increasing timestamps keep ordering deterministic in tests
        let created_at = rows
            .products
            .iter()
            .map(|p| p.created_at)
            .max()
            .map_or_else(Utc::now, |latest| latest + Duration::milliseconds(1));
        rows.products
            .push(product.clone().into_product(id, created_at));
        Ok(id)
    }

    async fn update(&self, id: i64, product: &NewProduct) -> Result<bool, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(existing) = rows.products.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        *existing = product.clone().into_product(id, existing.created_at);
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.products.len();
        rows.products.retain(|p| p.id != id);
        Ok(rows.products.len() != before)
    }

    async fn search(&self, text: &str) -> Result<Vec<Product>, StoreError> {
        let needle = text.to_lowercase();
        let mut products: Vec<Product> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|p| {
                p.product_name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
                    || p.origin.to_lowercase().contains(&needle)
            })
            .collect();
        newest_first(&mut products);
        Ok(products)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(i64::try_from(rows.products.len()).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn sample(name: &str) -> NewProduct {
        NewProduct {
            product_name: name.to_string(),
            image_url: Some("images/sample.png".to_string()),
            origin: "EcoCorp".to_string(),
            specifications: Some("USB-C".to_string()),
            quantity: "1 unit".to_string(),
            price: BigDecimal::from_str("19.99").unwrap(),
            energy_savings: "A+".to_string(),
            description: "Rechargeable".to_string(),
            eco: false,
        }
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trips_attributes() {
        let store = MemoryStore::new();
        let new = sample("Solar Lamp");
        let id = store.insert(&new).await.unwrap();

        let stored = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored, new.into_product(id, stored.created_at));
        assert!(store.get_by_id(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_newest_insert_lists_first() {
        let store = MemoryStore::new();
        let first = store.insert(&sample("First")).await.unwrap();
        let second = store.insert(&sample("Second")).await.unwrap();

        let ids: Vec<i64> = store.list_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_update_delete_and_search() {
        let store = MemoryStore::new();
        let id = store.insert(&sample("Solar Lamp")).await.unwrap();
        store.insert(&sample("Oat Milk")).await.unwrap();

        assert!(store.update(id, &sample("Solar Lantern")).await.unwrap());
        assert!(!store.update(999, &sample("Ghost")).await.unwrap());

        let hits = store.search("LANTERN").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert_eq!(store.search("ecocorp").await.unwrap().len(), 2);

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryStore::failing();
        assert!(matches!(
            store.list_all().await,
            Err(StoreError::Database(_))
        ));
    }
}
