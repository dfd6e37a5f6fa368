//! Document backend: `QuizStore` over MongoDB collections `users` and `results`
//!
//! Users are keyed by `ObjectId`; a unique index on `users.email` turns the
//! losing insert of a concurrent first login into `DuplicateUser`.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::error::{ErrorKind, WriteError, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use quiz_core::{CoreResult, JoinedResult, NewResult, NewUser, QuizError, QuizStore, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{DbError, DbResult};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    email: String,
    name: String,
    picture: Option<String>,
    /// Absent on documents written before sign-up times were recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<BsonDateTime>,
}

impl UserDoc {
    fn into_user(self) -> CoreResult<User> {
        let id = self
            .id
            .ok_or_else(|| QuizError::Storage(format!("user document without _id: {}", self.email)))?;
        // Without a stored sign-up time, the ObjectId's creation second stands in
        let stamp = self.created_at.unwrap_or_else(|| id.timestamp());
        let created_at =
            chrono::DateTime::from_timestamp_millis(stamp.timestamp_millis()).unwrap_or_else(Utc::now);

        Ok(User {
            id: id.to_hex(),
            email: self.email,
            name: self.name,
            picture: self.picture,
            created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResultDoc {
    user_id: ObjectId,
    points: i64,
    time_taken: f64,
    created_at: BsonDateTime,
}

/// Output shape of the leaderboard aggregation
#[derive(Debug, Deserialize)]
struct JoinedDoc {
    user_id: ObjectId,
    name: String,
    points: i64,
    time_taken: f64,
}

/// MongoDB-backed store. The driver pools connections internally; each
/// operation checks one out for its duration.
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<UserDoc>,
    results: Collection<ResultDoc>,
}

impl MongoStore {
    /// Connect and make sure the email uniqueness index exists
    pub async fn connect(uri: &str, database: &str) -> DbResult<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;
        let db = client.database(database);

        let store = Self {
            users: db.collection("users"),
            results: db.collection("results"),
        };

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        store
            .users
            .create_index(email_index)
            .await
            .map_err(|e| DbError::Migration(format!("users.email index: {e}")))?;

        info!(database, "MongoDB store ready");
        Ok(store)
    }
}

fn storage(err: mongodb::error::Error) -> QuizError {
    QuizError::Storage(err.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code: DUPLICATE_KEY, .. }))
    )
}

fn millis(dt: chrono::DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

#[async_trait]
impl QuizStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.users
            .find_one(doc! { "email": email })
            .await
            .map_err(storage)?
            .map(UserDoc::into_user)
            .transpose()
    }

    async fn insert_user(&self, user: NewUser) -> CoreResult<User> {
        let mut document = UserDoc {
            id: None,
            email: user.email,
            name: user.name,
            picture: user.picture,
            created_at: Some(millis(user.created_at)),
        };

        let inserted = match self.users.insert_one(&document).await {
            Ok(inserted) => inserted,
            Err(e) if is_duplicate_key(&e) => return Err(QuizError::DuplicateUser(document.email)),
            Err(e) => return Err(storage(e)),
        };

        document.id = inserted.inserted_id.as_object_id();
        document.into_user()
    }

    async fn user_exists(&self, user_id: &str) -> CoreResult<bool> {
        // Ids that are not ObjectIds cannot name a user here
        let Ok(oid) = ObjectId::parse_str(user_id) else {
            debug!(%user_id, "Rejecting malformed ObjectId");
            return Ok(false);
        };

        let found = self
            .users
            .find_one(doc! { "_id": oid })
            .await
            .map_err(storage)?;
        Ok(found.is_some())
    }

    async fn insert_result(&self, result: NewResult) -> CoreResult<()> {
        let user_id = ObjectId::parse_str(&result.user_id)
            .map_err(|_| QuizError::UserNotFound(result.user_id.clone()))?;

        let document = ResultDoc {
            user_id,
            points: result.points,
            time_taken: result.time_taken,
            created_at: millis(result.created_at),
        };
        self.results.insert_one(&document).await.map_err(storage)?;
        Ok(())
    }

    async fn joined_results(&self) -> CoreResult<Vec<JoinedResult>> {
        let pipeline = vec![
            doc! { "$sort": { "_id": 1 } },
            doc! {
                "$lookup": {
                    "from": "users",
                    "localField": "user_id",
                    "foreignField": "_id",
                    "as": "user_info"
                }
            },
            // Drops results without a matching user (inner join)
            doc! { "$unwind": "$user_info" },
            doc! {
                "$project": {
                    "_id": 0,
                    "user_id": 1,
                    "name": "$user_info.name",
                    "points": 1,
                    "time_taken": 1
                }
            },
        ];

        let mut cursor = self
            .results
            .aggregate(pipeline)
            .await
            .map_err(storage)?
            .with_type::<JoinedDoc>();

        let mut rows = Vec::new();
        while let Some(doc) = cursor.try_next().await.map_err(storage)? {
            rows.push(JoinedResult {
                user_id: doc.user_id.to_hex(),
                name: doc.name,
                points: doc.points,
                time_taken: doc.time_taken,
            });
        }
        Ok(rows)
    }

    async fn has_result(&self, user_id: &str) -> CoreResult<bool> {
        let Ok(oid) = ObjectId::parse_str(user_id) else {
            return Ok(false);
        };

        let found = self
            .results
            .find_one(doc! { "user_id": oid })
            .await
            .map_err(storage)?;
        Ok(found.is_some())
    }
}
