use crate::error::ConnectorError;
use bson::{doc, oid::ObjectId, Document};
use futures_util::TryStreamExt;
use model::ShardDescriptor;
use mongodb::{options::FindOptions, Client, Collection, Cursor};
use tracing::warn;

/// Source-side connector. Owns partitioning: the planner (§4.8) only asks it
/// for bounds and never interprets their structure.
pub struct MongoSource {
    client: Client,
    db_name: String,
    collection_name: String,
}

impl MongoSource {
    pub async fn connect(
        uri: &str,
        db_name: impl Into<String>,
        collection_name: impl Into<String>,
    ) -> Result<Self, ConnectorError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self {
            client,
            db_name: db_name.into(),
            collection_name: collection_name.into(),
        })
    }

    fn collection(&self) -> Collection<Document> {
        self.client
            .database(&self.db_name)
            .collection(&self.collection_name)
    }

    /// Computes `shard_count` bounds over `_id`. Prefers `$bucketAuto`
    /// sampling (cheap, index-friendly); falls back to an even split over
    /// the document count when the aggregation can't produce enough buckets
    /// (tiny collections, or a mock source in tests that doesn't support it).
    ///
    /// `partition_field`/`partition_strategy` are accepted as configured
    /// hints, but only `_id` range partitioning is implemented: anything
    /// else is logged and ignored rather than silently dropped.
    pub async fn plan_shards(
        &self,
        shard_count: u32,
        partition_field: Option<&str>,
        partition_strategy: Option<&str>,
    ) -> Result<Vec<ShardDescriptor>, ConnectorError> {
        if let Some(field) = partition_field {
            if field != "_id" {
                warn!(field, "partitioning only supports _id; ignoring configured partition field");
            }
        }
        if let Some(strategy) = partition_strategy {
            if !strategy.eq_ignore_ascii_case("range") {
                warn!(strategy, "partitioning only supports _id range bucketing; ignoring configured strategy");
            }
        }
        match self.bucket_auto_bounds(shard_count).await {
            Ok(bounds) if bounds.len() as u32 == shard_count => Ok(bounds),
            _ => self.even_split_bounds(shard_count).await,
        }
    }

    async fn bucket_auto_bounds(
        &self,
        shard_count: u32,
    ) -> Result<Vec<ShardDescriptor>, ConnectorError> {
        let pipeline = vec![doc! {
            "$bucketAuto": { "groupBy": "$_id", "buckets": shard_count as i32 }
        }];
        let mut cursor = self.collection().aggregate(pipeline).await?;

        let mut descriptors = Vec::new();
        let mut shard_id = 0u32;
        while let Some(bucket) = cursor.try_next().await? {
            let Some(id_doc) = bucket.get_document("_id").ok() else {
                continue;
            };
            let lower = id_doc
                .get("min")
                .map(bson_token)
                .unwrap_or_default();
            let upper = id_doc
                .get("max")
                .map(bson_token)
                .unwrap_or_default();
            let count = bucket.get_i32("count").unwrap_or(0);
            descriptors.push(
                ShardDescriptor::new(shard_id, lower, upper).with_size_hint(count.max(0) as u64),
            );
            shard_id += 1;
        }
        Ok(descriptors)
    }

    async fn even_split_bounds(
        &self,
        shard_count: u32,
    ) -> Result<Vec<ShardDescriptor>, ConnectorError> {
        let total = self.collection().estimated_document_count().await?.max(0) as u64;
        let shard_count = shard_count.max(1) as u64;
        let per_shard = (total / shard_count).max(1);

        let mut descriptors = Vec::new();
        let mut lower = ObjectId::from_bytes([0u8; 12]).to_hex();
        for shard_id in 0..shard_count {
            let skip = (shard_id + 1) * per_shard;
            let upper = if shard_id + 1 == shard_count {
                "\u{10FFFF}".to_string()
            } else {
                self.id_at_offset(skip).await?.unwrap_or_else(|| "\u{10FFFF}".to_string())
            };
            descriptors.push(ShardDescriptor::new(shard_id as u32, lower.clone(), upper.clone()));
            lower = upper;
        }
        Ok(descriptors)
    }

    async fn id_at_offset(&self, offset: u64) -> Result<Option<String>, ConnectorError> {
        let options = FindOptions::builder()
            .sort(doc! {"_id": 1})
            .skip(offset)
            .limit(1)
            .projection(doc! {"_id": 1})
            .build();
        let mut cursor = self.collection().find(doc! {}).with_options(options).await?;
        if let Some(doc) = cursor.try_next().await? {
            Ok(doc.get("_id").map(bson_token))
        } else {
            Ok(None)
        }
    }

    /// Draws up to `sample_size` random documents for the checksum validator (§4.10).
    pub async fn sample_documents(&self, sample_size: usize) -> Result<Vec<Document>, ConnectorError> {
        let pipeline = vec![doc! { "$sample": { "size": sample_size as i64 } }];
        let mut cursor = self.collection().aggregate(pipeline).await?;
        let mut docs = Vec::with_capacity(sample_size);
        while let Some(doc) = cursor.try_next().await? {
            docs.push(doc);
        }
        Ok(docs)
    }

    /// Streams raw documents whose `_id` falls in `[lower_bound, upper_bound)`.
    pub async fn stream_shard(
        &self,
        shard: &ShardDescriptor,
        batch_size: u32,
    ) -> Result<Cursor<Document>, ConnectorError> {
        let filter = doc! {
            "_id": { "$gte": bound_to_bson(&shard.lower_bound), "$lt": bound_to_bson(&shard.upper_bound) },
        };
        let options = FindOptions::builder()
            .sort(doc! {"_id": 1})
            .batch_size(batch_size)
            .build();
        Ok(self.collection().find(filter).with_options(options).await?)
    }
}

fn bson_token(value: &bson::Bson) -> String {
    match value {
        bson::Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

fn bound_to_bson(token: &str) -> bson::Bson {
    match ObjectId::parse_str(token) {
        Ok(oid) => bson::Bson::ObjectId(oid),
        Err(_) => bson::Bson::String(token.to_string()),
    }
}
