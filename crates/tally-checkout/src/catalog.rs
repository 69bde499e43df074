//! # Catalog Cache
//!
//! The engine's shared snapshot of the product catalog.
//!
//! Loaded at session start, replaced wholesale by the refresh worker, and
//! read by the processor for stock re-validation at submit time. Replacing
//! the snapshot never mutates an in-progress cart: cart lines carry their
//! own frozen price/rate.

use std::sync::RwLock;

use tally_core::Product;

/// Shared, replaceable catalog snapshot.
#[derive(Debug, Default)]
pub struct CatalogCache {
    products: RwLock<Vec<Product>>,
}

impl CatalogCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        CatalogCache {
            products: RwLock::new(Vec::new()),
        }
    }

    /// Replaces the whole snapshot.
    pub fn replace(&self, products: Vec<Product>) {
        *self.products.write().expect("catalog lock poisoned") = products;
    }

    /// Clones the full snapshot.
    pub fn all(&self) -> Vec<Product> {
        self.products.read().expect("catalog lock poisoned").clone()
    }

    /// Finds one product by id.
    pub fn find(&self, product_id: &str) -> Option<Product> {
        self.products
            .read()
            .expect("catalog lock poisoned")
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
    }

    /// Number of products in the snapshot.
    pub fn len(&self) -> usize {
        self.products.read().expect("catalog lock poisoned").len()
    }

    /// Whether the snapshot is empty (nothing loaded yet).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
