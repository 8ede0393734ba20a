//! DynamoDB adapter implementing the `ItemRepository` port.
//!
//! Stores one document per catalog item in a single table with primary key
//! `id`. The id and the creation timestamp are stored as string attributes
//! (UUID text, RFC3339 UTC) so the persisted representation stays stable and
//! textually comparable regardless of store-native type variations; price is
//! a number attribute. Every operation is a single network round-trip.
//!
//! Notes:
//! - The domain `ItemRepository` trait is synchronous. We bridge to the async
//!   AWS SDK using an internal `tokio::runtime::Runtime` and `block_on`, or
//!   `block_in_place` when an ambient runtime already exists.
//! - No retries and no partial-failure handling: a failed call surfaces as
//!   `CoreError::Repository` to the caller.

use aws_sdk_dynamodb::{types::AttributeValue, Client};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use domain::{CoreError, Item, ItemId, ItemRepository};
use std::collections::HashMap;

/// Connection settings for the items table.
#[derive(Clone, Debug)]
pub struct DynamoConfig {
    pub table: String,
    /// Optional endpoint URL for a local/self-hosted store; when absent the
    /// SDK resolves the regional endpoint itself.
    pub endpoint: Option<String>,
}

impl DynamoConfig {
    /// Create with an explicit table name and the SDK's own endpoint
    /// resolution.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            endpoint: None,
        }
    }

    /// Build from environment variables:
    /// - `DYNAMO_TABLE_ITEMS` (required)
    /// - `DYNAMO_ENDPOINT_HOST` / `DYNAMO_ENDPOINT_PORT` (optional) —
    ///   assembled into `http://{host}:{port}` for local stores.
    pub fn from_env() -> Result<Self, CoreError> {
        let table = std::env::var("DYNAMO_TABLE_ITEMS")
            .map_err(|_| CoreError::Repository("missing DYNAMO_TABLE_ITEMS".into()))?;
        let endpoint = match std::env::var("DYNAMO_ENDPOINT_HOST") {
            Ok(host) => {
                let port = std::env::var("DYNAMO_ENDPOINT_PORT")
                    .ok()
                    .and_then(|p| p.parse::<u16>().ok())
                    .unwrap_or(8000);
                Some(format!("http://{}:{}", host, port))
            }
            Err(_) => None,
        };
        Ok(Self { table, endpoint })
    }
}

/// Repository backed by AWS DynamoDB.
///
/// Works both standalone (creates its own Tokio runtime) and inside an
/// existing runtime (reuses it via `Handle::current()`).
#[derive(Clone)]
pub struct DynamoItemsRepo {
    table: String,
    client: Client,
    // None when an ambient runtime exists; the bridge then uses block_in_place
    rt: Option<std::sync::Arc<tokio::runtime::Runtime>>,
}

impl DynamoItemsRepo {
    /// Create a new repo from explicit settings and an AWS SDK client.
    pub fn with_client(config: DynamoConfig, client: Client) -> Result<Self, CoreError> {
        let rt = Self::maybe_create_runtime()?;
        Ok(Self {
            table: config.table,
            client,
            rt,
        })
    }

    /// Construct with the given settings, building a default SDK client from
    /// the environment and honoring the optional endpoint override.
    pub fn new(config: DynamoConfig) -> Result<Self, CoreError> {
        let rt = Self::maybe_create_runtime()?;
        let conf = Self::block_on_with_rt(&rt, aws_config::load_from_env());
        let client = match &config.endpoint {
            Some(url) => Client::from_conf(
                aws_sdk_dynamodb::config::Builder::from(&conf)
                    .endpoint_url(url)
                    .build(),
            ),
            None => Client::new(&conf),
        };
        Ok(Self {
            table: config.table,
            client,
            rt,
        })
    }

    /// Construct from the environment variables documented on
    /// [`DynamoConfig::from_env`].
    pub fn from_env() -> Result<Self, CoreError> {
        Self::new(DynamoConfig::from_env()?)
    }

    /// Check if we're inside a Tokio runtime. If yes, return None (reuse
    /// existing). If no, create a new runtime.
    fn maybe_create_runtime() -> Result<Option<std::sync::Arc<tokio::runtime::Runtime>>, CoreError>
    {
        if tokio::runtime::Handle::try_current().is_ok() {
            Ok(None)
        } else {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .map_err(|e| CoreError::Repository(format!("tokio runtime init: {e}")))?;
            Ok(Some(std::sync::Arc::new(rt)))
        }
    }

    /// Run an async future, using either our owned runtime or the current one.
    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        Self::block_on_with_rt(&self.rt, fut)
    }

    fn block_on_with_rt<F: std::future::Future>(
        rt: &Option<std::sync::Arc<tokio::runtime::Runtime>>,
        fut: F,
    ) -> F::Output {
        match rt {
            Some(rt) => rt.block_on(fut),
            None => {
                tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
            }
        }
    }
}

impl ItemRepository for DynamoItemsRepo {
    fn list(&self) -> Result<Vec<Item>, CoreError> {
        let table = self.table.clone();
        let fut = async { self.client.scan().table_name(table).send().await };
        let out = self.block_on(fut).map_err(map_sdk_err)?;
        let mut res = Vec::new();
        for it in out.items().iter() {
            res.push(item_to_domain(it)?);
        }
        Ok(res)
    }

    fn get(&self, id: &ItemId) -> Result<Option<Item>, CoreError> {
        let table = self.table.clone();
        let key = id.as_str().to_string();
        let fut = async {
            self.client
                .get_item()
                .table_name(table)
                .key("id", AttributeValue::S(key))
                .send()
                .await
        };
        let out = self.block_on(fut).map_err(map_sdk_err)?;
        match out.item() {
            Some(item) => Ok(Some(item_to_domain(item)?)),
            None => Ok(None),
        }
    }

    fn create(&self, item: Item) -> Result<(), CoreError> {
        // Conditional put: an id already present is rejected, never overwritten
        let table = self.table.clone();
        let attrs = domain_to_item(&item);
        let fut = async {
            self.client
                .put_item()
                .table_name(table)
                .set_item(Some(attrs))
                .condition_expression("attribute_not_exists(#i)")
                .expression_attribute_names("#i", "id")
                .send()
                .await
        };
        self.block_on(fut).map_err(|e| match e.as_service_error() {
            Some(se) if se.code() == Some("ConditionalCheckFailedException") => {
                CoreError::AlreadyExists
            }
            _ => map_sdk_err(e),
        })?;
        Ok(())
    }

    fn update(&self, item: &Item) -> Result<(), CoreError> {
        // Full replacement of the stored document, conditioned on existence
        let table = self.table.clone();
        let attrs = domain_to_item(item);
        let fut = async {
            self.client
                .put_item()
                .table_name(table)
                .set_item(Some(attrs))
                .condition_expression("attribute_exists(#i)")
                .expression_attribute_names("#i", "id")
                .send()
                .await
        };
        self.block_on(fut).map_err(|e| match e.as_service_error() {
            Some(se) if se.code() == Some("ConditionalCheckFailedException") => CoreError::NotFound,
            _ => map_sdk_err(e),
        })?;
        Ok(())
    }

    fn delete(&self, id: &ItemId) -> Result<(), CoreError> {
        let table = self.table.clone();
        let key = id.as_str().to_string();
        let fut = async {
            self.client
                .delete_item()
                .table_name(table)
                .key("id", AttributeValue::S(key))
                .condition_expression("attribute_exists(#i)")
                .expression_attribute_names("#i", "id")
                .send()
                .await
        };
        self.block_on(fut).map_err(|e| match e.as_service_error() {
            Some(se) if se.code() == Some("ConditionalCheckFailedException") => CoreError::NotFound,
            _ => map_sdk_err(e),
        })?;
        Ok(())
    }
}

fn map_sdk_err<E: ProvideErrorMetadata + std::fmt::Display>(e: E) -> CoreError {
    if e.code() == Some("ResourceNotFoundException") {
        return CoreError::Repository("missing table".into());
    }
    CoreError::Repository(format!("dynamo error: {e}"))
}

fn domain_to_item(item: &Item) -> HashMap<String, AttributeValue> {
    let mut m = HashMap::new();
    m.insert("id".into(), AttributeValue::S(item.id.as_str().to_string()));
    m.insert("name".into(), AttributeValue::S(item.name.clone()));
    if let Some(ref description) = item.description {
        m.insert("description".into(), AttributeValue::S(description.clone()));
    }
    m.insert("price".into(), AttributeValue::N(item.price.to_string()));
    m.insert(
        "created_date".into(),
        AttributeValue::S(http_common::system_time_to_rfc3339(item.created_date)),
    );
    m
}

fn item_to_domain(item: &HashMap<String, AttributeValue>) -> Result<Item, CoreError> {
    let id = item
        .get("id")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| CoreError::Repository("item missing id".into()))?;
    let name = item
        .get("name")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| CoreError::Repository("item missing name".into()))?
        .to_string();
    let description = item
        .get("description")
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string());
    let price = item
        .get("price")
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| CoreError::Repository("item missing price".into()))?;
    let created_date = item
        .get("created_date")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| CoreError::Repository("item missing created_date".into()))?;

    let id = ItemId::new(id.to_string())
        .map_err(|e| CoreError::Repository(format!("bad id in item: {e}")))?;
    let created_date = http_common::parse_rfc3339(created_date)
        .map_err(|e| CoreError::Repository(format!("bad created_date: {e}")))?;

    Ok(Item {
        id,
        name,
        description,
        price,
        created_date,
    })
}
