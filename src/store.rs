//! The document-store collaborator.
//!
//! The gateway never speaks the wire protocol itself; everything it needs
//! from the store is captured by [`DocumentStore`] — enumeration, bounded
//! finds, counting, and aggregation. [`MongoStore`] is the production
//! implementation over the MongoDB driver; tests implement the trait with
//! an in-memory double.
//!
//! Counting may legitimately fail (federated/virtual sources don't support
//! it); callers that use counts as advisories tolerate the error, callers
//! that need them propagate it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::{Client, Collection};

use crate::config::Config;

/// Abstract view of a multi-database document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All database names visible to the connection, system ones included.
    async fn database_names(&self) -> Result<Vec<String>>;

    /// Collection names within one database.
    async fn collection_names(&self, db: &str) -> Result<Vec<String>>;

    /// Up to `limit` documents matching `filter`, in store order.
    async fn find(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>>;

    /// One document matching `filter`, if any.
    async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
    ) -> Result<Option<Document>>;

    /// Count documents matching `filter`. May fail on stores that do not
    /// support counting.
    async fn count(&self, db: &str, collection: &str, filter: Document) -> Result<u64>;

    /// Run an aggregation pipeline and drain all result documents.
    async fn aggregate(
        &self,
        db: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>>;
}

/// MongoDB-backed [`DocumentStore`].
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    /// Connect using the configured URI. The driver connects lazily; this
    /// fails only on an unparseable connection string.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = Client::with_uri_str(&config.mongodb.uri)
            .await
            .with_context(|| "Failed to create MongoDB client from mongodb.uri")?;
        Ok(Self { client })
    }

    fn collection(&self, db: &str, collection: &str) -> Collection<Document> {
        self.client.database(db).collection::<Document>(collection)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn database_names(&self) -> Result<Vec<String>> {
        Ok(self.client.list_database_names().await?)
    }

    async fn collection_names(&self, db: &str) -> Result<Vec<String>> {
        Ok(self.client.database(db).list_collection_names().await?)
    }

    async fn find(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let cursor = self.collection(db, collection).find(filter).limit(limit).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
    ) -> Result<Option<Document>> {
        Ok(self.collection(db, collection).find_one(filter).await?)
    }

    async fn count(&self, db: &str, collection: &str, filter: Document) -> Result<u64> {
        Ok(self.collection(db, collection).count_documents(filter).await?)
    }

    async fn aggregate(
        &self,
        db: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>> {
        let cursor = self.collection(db, collection).aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }
}
