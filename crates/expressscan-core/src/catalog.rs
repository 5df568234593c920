//! Product lookup for scanned barcodes.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;

/// Products the store's scanner can resolve, keyed by barcode.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: HashMap<String, Product>,
}

impl ProductCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        ProductCatalog {
            products: products
                .into_iter()
                .map(|p| (p.barcode.clone(), p))
                .collect(),
        }
    }

    /// The shelf of the launch store.
    pub fn store_default() -> Self {
        let product = |barcode: &str, name: &str, rupees: i64| Product {
            barcode: barcode.to_string(),
            name: name.to_string(),
            unit_price: Money::from_rupees(rupees),
        };

        ProductCatalog::new([
            product("123456789012", "Milk", 30),
            product("987654321098", "Bread", 25),
            product("111122223333", "Eggs (Dozen)", 70),
            product("8901058842029", "Parle-G Biscuits", 10),
            product("000111222333", "Cornflakes", 40),
            product("123123123123", "Jam", 40),
        ])
    }

    /// Resolves a barcode, failing with `ProductNotFound`.
    pub fn lookup(&self, barcode: &str) -> CoreResult<&Product> {
        self.products
            .get(barcode)
            .ok_or_else(|| CoreError::ProductNotFound(barcode.to_string()))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
