use crate::storage::write_atomic;
use convodeck_core::{NewOrder, Order, OrderBook, OrderRepository, OrderStatus, StorageError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

const ORDERS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct OrdersFile {
    version: u32,
    #[serde(flatten)]
    book: OrderBook,
}

/// Order table persisted as a single versioned JSON file. Every mutation
/// rewrites the file before returning.
#[derive(Debug)]
pub struct JsonOrderBook {
    path: PathBuf,
    book: OrderBook,
}

impl JsonOrderBook {
    /// Opens `path`, starting an empty book when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let book = match fs::read_to_string(&path) {
            Ok(body) => {
                let file: OrdersFile = serde_json::from_str(&body)?;
                if file.version != ORDERS_SCHEMA_VERSION {
                    return Err(StorageError::Unavailable(format!(
                        "unsupported orders version {} (expected {})",
                        file.version, ORDERS_SCHEMA_VERSION
                    )));
                }
                file.book
            }
            Err(err) if err.kind() == ErrorKind::NotFound => OrderBook::new(),
            Err(err) => return Err(err.into()),
        };
        info!(path = %path.display(), orders = book.orders.len(), "order book opened");
        Ok(Self { path, book })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.book.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.book.orders.is_empty()
    }

    fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OrdersFileRef {
            version: ORDERS_SCHEMA_VERSION,
            book: &self.book,
        };
        let body = serde_json::to_string_pretty(&file)?;
        write_atomic(&self.path, &body)?;
        debug!(path = %self.path.display(), orders = self.len(), "order book saved");
        Ok(())
    }
}

#[derive(Serialize)]
struct OrdersFileRef<'a> {
    version: u32,
    #[serde(flatten)]
    book: &'a OrderBook,
}

impl OrderRepository for JsonOrderBook {
    fn create(&mut self, order: NewOrder, now: OffsetDateTime) -> Result<Order, StorageError> {
        let order = self.book.insert(order, now);
        if let Err(err) = self.save() {
            self.book.orders.retain(|existing| existing.id != order.id);
            return Err(err);
        }
        Ok(order)
    }

    fn get(&self, id: Uuid) -> Result<Option<Order>, StorageError> {
        Ok(self.book.find(id).cloned())
    }

    fn get_by_reference(&self, reference: &str) -> Result<Option<Order>, StorageError> {
        Ok(self.book.find_by_reference(reference).cloned())
    }

    fn list(&self) -> Result<Vec<Order>, StorageError> {
        Ok(self.book.newest_first())
    }

    fn update_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
        notes: Option<String>,
        now: OffsetDateTime,
    ) -> Result<Option<Order>, StorageError> {
        let Some(previous) = self.book.find(id).cloned() else {
            return Ok(None);
        };
        let Some(order) = self.book.set_status(id, status, notes, now) else {
            return Ok(None);
        };
        if let Err(err) = self.save() {
            if let Some(slot) = self.book.orders.iter_mut().find(|order| order.id == id) {
                *slot = previous;
            }
            return Err(err);
        }
        Ok(Some(order))
    }
}
