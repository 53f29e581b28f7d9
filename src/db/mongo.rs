//! MongoDB client and collection wrapper

use bson::{doc, Document};
use futures_util::{Stream, TryStreamExt};
use mongodb::{
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    results::{DeleteResult, UpdateResult},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::types::LingoError;

/// Collection holding integer id sequences, one document per sequence name
pub const COUNTER_COLLECTION: &str = "counters";

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping the database
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, LingoError> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast when MongoDB is unreachable
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| LingoError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| LingoError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, creating its indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, LingoError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Id sequences backed by the counters collection
    pub fn counters(&self) -> Counters {
        Counters {
            inner: self
                .client
                .database(&self.db_name)
                .collection::<Document>(COUNTER_COLLECTION),
        }
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with schema-declared indexes
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, LingoError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), LingoError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| LingoError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    pub async fn insert_one(&self, item: &T) -> Result<(), LingoError> {
        self.inner
            .insert_one(item)
            .await
            .map(|_| ())
            .map_err(|e| LingoError::Database(format!("Insert failed: {}", e)))
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, LingoError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| LingoError::Database(format!("Find failed: {}", e)))
    }

    /// Find documents matching `filter`, ordered by `sort`
    pub async fn find_sorted(&self, filter: Document, sort: Document) -> Result<Vec<T>, LingoError> {
        let cursor = self
            .inner
            .find(filter)
            .sort(sort)
            .await
            .map_err(|e| LingoError::Database(format!("Find failed: {}", e)))?;

        collect_documents(cursor).await
    }

    /// Replace the document matching `filter`, inserting it when absent
    pub async fn upsert_one(&self, filter: Document, item: &T) -> Result<UpdateResult, LingoError> {
        self.inner
            .replace_one(filter, item)
            .upsert(true)
            .await
            .map_err(|e| LingoError::Database(format!("Upsert failed: {}", e)))
    }

    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, LingoError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| LingoError::Database(format!("Update failed: {}", e)))
    }

    /// Apply `update` atomically, returning the document as it was
    /// before or after the write
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        return_document: ReturnDocument,
    ) -> Result<Option<T>, LingoError> {
        self.inner
            .find_one_and_update(filter, update)
            .return_document(return_document)
            .await
            .map_err(|e| LingoError::Database(format!("Update failed: {}", e)))
    }

    pub async fn delete_one(&self, filter: Document) -> Result<DeleteResult, LingoError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| LingoError::Database(format!("Delete failed: {}", e)))
    }

    pub async fn count(&self, filter: Document) -> Result<u64, LingoError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| LingoError::Database(format!("Count failed: {}", e)))
    }
}

/// Atomic integer sequences
#[derive(Debug, Clone)]
pub struct Counters {
    inner: Collection<Document>,
}

impl Counters {
    /// Next value of the named sequence, starting at 1
    pub async fn next_id(&self, name: &str) -> Result<i64, LingoError> {
        let counter = self
            .inner
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| LingoError::Database(format!("Sequence update failed: {}", e)))?
            .ok_or_else(|| LingoError::Database(format!("Sequence '{}' missing", name)))?;

        counter
            .get_i64("seq")
            .or_else(|_| counter.get_i32("seq").map(i64::from))
            .map_err(|e| LingoError::Database(format!("Sequence '{}' corrupt: {}", name, e)))
    }
}

/// Drain a cursor, failing on the first document that cannot be read
async fn collect_documents<T, E, S>(cursor: S) -> Result<Vec<T>, LingoError>
where
    S: Stream<Item = Result<T, E>>,
    E: std::fmt::Display,
{
    cursor.try_collect().await.map_err(|e| {
        error!("Error reading document: {}", e);
        LingoError::Database(format!("Error reading document: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn test_collect_documents_keeps_order() {
        let cursor = stream::iter(vec![Ok::<_, String>(1), Ok(2), Ok(3)]);
        assert_eq!(collect_documents(cursor).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unreadable_document_fails_the_read() {
        let cursor = stream::iter(vec![Ok(1), Err("invalid type: string".to_string()), Ok(3)]);
        let err = collect_documents(cursor).await.unwrap_err();
        assert!(matches!(err, LingoError::Database(ref msg) if msg.contains("invalid type")));
    }
}
