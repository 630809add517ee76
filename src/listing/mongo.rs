//! MongoDB-backed listing store.
//!
//! Listings live in the `cars` collection and reference users in `users`
//! by ObjectId. Owner expansion runs as a second query over the distinct
//! owner ids, the same way a populate would.

use std::collections::HashMap;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

use super::model::{Listing, ListingChanges, NewListing, Owner};
use super::store::ListingStore;

/// Collection holding listing documents.
pub const LISTINGS_COLLECTION: &str = "cars";

/// Collection holding user documents (read-only from this service).
pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Serialize, Deserialize)]
struct ListingDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    title: String,
    description: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    owner: ObjectId,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl ListingDocument {
    fn into_listing(self, usernames: Option<&HashMap<ObjectId, String>>) -> Listing {
        let username = usernames.and_then(|names| names.get(&self.owner).cloned());
        Listing {
            id: self.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            title: self.title,
            description: self.description,
            images: self.images,
            tags: self.tags,
            owner: Owner {
                id: self.owner.to_hex(),
                username,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    username: Option<String>,
}

/// Listing store over a MongoDB database.
#[derive(Clone)]
pub struct MongoListingStore {
    database: Database,
    listings: Collection<ListingDocument>,
    users: Collection<UserDocument>,
}

impl MongoListingStore {
    /// Create a store over an already-connected database handle.
    pub fn new(database: Database) -> Self {
        Self {
            listings: database.collection(LISTINGS_COLLECTION),
            users: database.collection(USERS_COLLECTION),
            database,
        }
    }

    /// Connect to `uri`, using the database named in the URI or
    /// `fallback_database` when the URI names none.
    pub async fn connect(uri: &str, fallback_database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(fallback_database));
        debug!(database = database.name(), "Opened MongoDB database");
        Ok(Self::new(database))
    }

    /// Name of the underlying database.
    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn usernames(
        &self,
        docs: &[ListingDocument],
    ) -> Result<HashMap<ObjectId, String>, StoreError> {
        let mut owners: Vec<ObjectId> = docs.iter().map(|d| d.owner).collect();
        owners.sort();
        owners.dedup();
        if owners.is_empty() {
            return Ok(HashMap::new());
        }

        let users: Vec<UserDocument> = self
            .users
            .find(doc! { "_id": { "$in": owners } })
            .projection(doc! { "username": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(users
            .into_iter()
            .filter_map(|u| u.username.map(|name| (u.id, name)))
            .collect())
    }

    async fn find_expanded(&self, filter: Document) -> Result<Vec<Listing>, StoreError> {
        let docs: Vec<ListingDocument> = self.listings.find(filter).await?.try_collect().await?;
        let names = self.usernames(&docs).await?;
        Ok(docs
            .into_iter()
            .map(|d| d.into_listing(Some(&names)))
            .collect())
    }
}

/// Parse a hex id, treating malformed ids as "no such document".
fn lookup_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

#[async_trait]
impl ListingStore for MongoListingStore {
    async fn list_all(&self) -> Result<Vec<Listing>, StoreError> {
        self.find_expanded(doc! {}).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>, StoreError> {
        let Some(owner) = lookup_id(owner_id) else {
            return Ok(Vec::new());
        };
        let docs: Vec<ListingDocument> = self
            .listings
            .find(doc! { "owner": owner })
            .await?
            .try_collect()
            .await?;
        Ok(docs.into_iter().map(|d| d.into_listing(None)).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Listing>, StoreError> {
        let Some(oid) = lookup_id(id) else {
            return Ok(None);
        };
        let mut found = self.find_expanded(doc! { "_id": oid }).await?;
        Ok(found.pop())
    }

    async fn insert(&self, listing: NewListing) -> Result<Listing, StoreError> {
        let owner = ObjectId::parse_str(&listing.owner_id)
            .map_err(|_| StoreError::InvalidId(listing.owner_id.clone()))?;
        let now = Utc::now();
        let mut document = ListingDocument {
            id: Some(ObjectId::new()),
            title: listing.title,
            description: listing.description,
            images: listing.images,
            tags: listing.tags,
            owner,
            created_at: now,
            updated_at: now,
        };

        let result = self.listings.insert_one(&document).await?;
        if let Some(oid) = result.inserted_id.as_object_id() {
            document.id = Some(oid);
        }
        debug!(listing_id = ?document.id, "Inserted listing");
        Ok(document.into_listing(None))
    }

    async fn update(
        &self,
        id: &str,
        changes: ListingChanges,
    ) -> Result<Option<Listing>, StoreError> {
        let Some(oid) = lookup_id(id) else {
            return Ok(None);
        };
        let update = doc! {
            "$set": {
                "title": changes.title,
                "description": changes.description,
                "images": changes.images,
                "tags": changes.tags,
                "updatedAt": bson::DateTime::from_chrono(Utc::now()),
            }
        };

        let updated = self
            .listings
            .find_one_and_update(doc! { "_id": oid }, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(|d| d.into_listing(None)))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Some(oid) = lookup_id(id) else {
            return Ok(false);
        };
        let result = self.listings.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
