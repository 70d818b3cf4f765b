//! Redis storage implementation
//!
//! Layout under the namespace `{prefix}:{table}`:
//! - `:e:{key}`      entity JSON
//! - `:index`        sorted set of keys scored by insertion order
//! - `:u:{field}`    hash of unique value -> key
//! - `:order`, `:seq` counters for insertion order and id allocation

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use crate::domain::storage::{ensure_unique_field, Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Configuration for Redis storage
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "keygate".to_string(),
        }
    }
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Redis-backed storage
///
/// Key and unique-field claims use `SET NX` / `HSETNX`, so two concurrent
/// creates for the same key cannot both succeed. Updates and deletes run as
/// compare-and-set scripts against the JSON they were read from.
pub struct RedisStorage<E>
where
    E: StorageEntity,
{
    connection: ConnectionManager,
    namespace: String,
    update_script: Script,
    delete_script: Script,
    _phantom: PhantomData<E>,
}

impl<E> fmt::Debug for RedisStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStorage")
            .field("namespace", &self.namespace)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

/// Compare-and-set update of an entity and its unique claims
///
/// KEYS: entity key, unique hash prefix.
/// ARGV: owner key, expected current JSON, new JSON, count of previous
/// (field, value) pairs, the previous pairs, then the new pairs.
/// Returns 1 on success, 0 if the entity is gone, -1 on a unique clash and
/// -2 if the entity changed since it was read.
const UPDATE_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return 0
end
if current ~= ARGV[2] then
    return -2
end
local new_start = 5 + tonumber(ARGV[4]) * 2
for i = new_start, #ARGV, 2 do
    local owner = redis.call('HGET', KEYS[2] .. ARGV[i], ARGV[i + 1])
    if owner and owner ~= ARGV[1] then
        return -1
    end
end
for i = 5, new_start - 1, 2 do
    if redis.call('HGET', KEYS[2] .. ARGV[i], ARGV[i + 1]) == ARGV[1] then
        redis.call('HDEL', KEYS[2] .. ARGV[i], ARGV[i + 1])
    end
end
for i = new_start, #ARGV, 2 do
    redis.call('HSET', KEYS[2] .. ARGV[i], ARGV[i + 1], ARGV[1])
end
redis.call('SET', KEYS[1], ARGV[3])
return 1
"#;

/// Removes an entity with the unique claims it still owns
///
/// KEYS: entity key, unique hash prefix, index key.
/// ARGV: owner key, expected current JSON, then the (field, value) pairs.
/// Returns 1 on success, 0 if already gone and -2 if the entity changed.
const DELETE_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return 0
end
if current ~= ARGV[2] then
    return -2
end
for i = 3, #ARGV, 2 do
    if redis.call('HGET', KEYS[2] .. ARGV[i], ARGV[i + 1]) == ARGV[1] then
        redis.call('HDEL', KEYS[2] .. ARGV[i], ARGV[i + 1])
    end
end
redis.call('DEL', KEYS[1])
redis.call('ZREM', KEYS[3], ARGV[1])
return 1
"#;

/// Attempts before a contended update or delete gives up
const MAX_UPDATE_ATTEMPTS: usize = 5;

fn unique_pairs<E: StorageEntity>(entity: &E) -> Vec<(&'static str, &str)> {
    E::UNIQUE_FIELDS
        .iter()
        .filter_map(|&field| entity.unique_value(field).map(|value| (field, value)))
        .collect()
}

fn redis_error(action: &str, e: redis::RedisError) -> DomainError {
    DomainError::storage(format!("Redis {} failed: {}", action, e))
}

impl<E> RedisStorage<E>
where
    E: StorageEntity,
{
    /// Opens a managed connection to the server
    pub async fn connect(config: &RedisConfig, table_name: &str) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::storage(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            connection,
            namespace: format!("{}:{}", config.key_prefix, table_name),
            update_script: Script::new(UPDATE_SCRIPT),
            delete_script: Script::new(DELETE_SCRIPT),
            _phantom: PhantomData,
        })
    }

    fn entity_key(&self, key: &str) -> String {
        format!("{}:e:{}", self.namespace, key)
    }

    fn index_key(&self) -> String {
        format!("{}:index", self.namespace)
    }

    fn unique_key(&self, field: &str) -> String {
        format!("{}:u:{}", self.namespace, field)
    }

    fn counter_key(&self, name: &str) -> String {
        format!("{}:{}", self.namespace, name)
    }

    fn decode(raw: &str) -> Result<E, DomainError> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::storage(format!("Failed to deserialize entity: {}", e)))
    }

    fn encode(entity: &E) -> Result<String, DomainError> {
        serde_json::to_string(entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))
    }

    /// Claims every unique value for `key`, releasing partial claims on clash
    async fn claim_unique_values(&self, entity: &E, key: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();
        let mut claimed: Vec<(&str, &str)> = Vec::new();

        for &field in E::UNIQUE_FIELDS {
            let Some(value) = entity.unique_value(field) else {
                continue;
            };

            let won: bool = conn
                .hset_nx(self.unique_key(field), value, key)
                .await
                .map_err(|e| redis_error("HSETNX", e))?;

            if !won {
                for (field, value) in claimed {
                    let _: () = conn
                        .hdel(self.unique_key(field), value)
                        .await
                        .map_err(|e| redis_error("HDEL", e))?;
                }
                return Err(DomainError::conflict(format!(
                    "Unique field '{}' already taken",
                    field
                )));
            }

            claimed.push((field, value));
        }

        Ok(())
    }
}

#[async_trait]
impl<E> Storage<E> for RedisStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn
            .get(self.entity_key(key.as_str()))
            .await
            .map_err(|e| redis_error("GET", e))?;

        raw.as_deref().map(Self::decode).transpose()
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let mut conn = self.connection.clone();

        let keys: Vec<String> = conn
            .zrange(self.index_key(), 0, -1)
            .await
            .map_err(|e| redis_error("ZRANGE", e))?;

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let entity_keys: Vec<String> = keys.iter().map(|k| self.entity_key(k)).collect();
        let raws: Vec<Option<String>> = conn
            .mget(entity_keys)
            .await
            .map_err(|e| redis_error("MGET", e))?;

        raws.iter()
            .flatten()
            .map(|raw| Self::decode(raw))
            .collect()
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = Self::encode(&entity)?;
        let mut conn = self.connection.clone();

        let stored: bool = conn
            .set_nx(self.entity_key(&key), &data)
            .await
            .map_err(|e| redis_error("SETNX", e))?;

        if !stored {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        if let Err(e) = self.claim_unique_values(&entity, &key).await {
            let _: () = conn
                .del(self.entity_key(&key))
                .await
                .map_err(|e| redis_error("DEL", e))?;
            return Err(e);
        }

        let position: i64 = conn
            .incr(self.counter_key("order"), 1)
            .await
            .map_err(|e| redis_error("INCR", e))?;

        let _: () = conn
            .zadd(self.index_key(), &key, position)
            .await
            .map_err(|e| redis_error("ZADD", e))?;

        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let entity_key = self.entity_key(&key);
        let data = Self::encode(&entity)?;
        let new_claims = unique_pairs(&entity);
        let mut conn = self.connection.clone();

        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let current: Option<String> = conn
                .get(&entity_key)
                .await
                .map_err(|e| redis_error("GET", e))?;

            let Some(current) = current else {
                break;
            };
            let previous = Self::decode(&current)?;
            let previous_claims = unique_pairs(&previous);

            let mut invocation = self.update_script.prepare_invoke();
            invocation
                .key(&entity_key)
                .key(self.unique_key(""))
                .arg(&key)
                .arg(&current)
                .arg(&data)
                .arg(previous_claims.len());
            for (field, value) in previous_claims.iter().chain(new_claims.iter()) {
                invocation.arg(*field).arg(*value);
            }

            let outcome: i64 = invocation
                .invoke_async(&mut conn)
                .await
                .map_err(|e| redis_error("EVALSHA", e))?;

            match outcome {
                1 => return Ok(entity),
                0 => break,
                -1 => {
                    return Err(DomainError::conflict(format!(
                        "Unique value of '{}' already taken",
                        key
                    )))
                }
                _ => continue,
            }
        }

        let still_present: bool = conn
            .exists(&entity_key)
            .await
            .map_err(|e| redis_error("EXISTS", e))?;

        if still_present {
            return Err(DomainError::storage(format!(
                "Entity '{}' kept changing during update",
                key
            )));
        }

        Err(DomainError::not_found(format!(
            "Entity with key '{}' not found",
            key
        )))
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let entity_key = self.entity_key(key.as_str());
        let mut conn = self.connection.clone();

        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let current: Option<String> = conn
                .get(&entity_key)
                .await
                .map_err(|e| redis_error("GET", e))?;

            let Some(current) = current else {
                return Ok(false);
            };
            let existing = Self::decode(&current)?;

            let mut invocation = self.delete_script.prepare_invoke();
            invocation
                .key(&entity_key)
                .key(self.unique_key(""))
                .key(self.index_key())
                .arg(key.as_str())
                .arg(&current);
            for (field, value) in unique_pairs(&existing) {
                invocation.arg(field).arg(value);
            }

            let outcome: i64 = invocation
                .invoke_async(&mut conn)
                .await
                .map_err(|e| redis_error("EVALSHA", e))?;

            match outcome {
                1 => return Ok(true),
                0 => return Ok(false),
                _ => continue,
            }
        }

        Err(DomainError::storage(format!(
            "Entity '{}' kept changing during delete",
            key.as_str()
        )))
    }

    async fn find_by_unique_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<E>, DomainError> {
        ensure_unique_field::<E>(field)?;
        let mut conn = self.connection.clone();

        let owner: Option<String> = conn
            .hget(self.unique_key(field), value)
            .await
            .map_err(|e| redis_error("HGET", e))?;

        let Some(owner) = owner else {
            return Ok(None);
        };

        let raw: Option<String> = conn
            .get(self.entity_key(&owner))
            .await
            .map_err(|e| redis_error("GET", e))?;

        raw.as_deref().map(Self::decode).transpose()
    }

    async fn next_id(&self) -> Result<u64, DomainError> {
        let mut conn = self.connection.clone();

        conn.incr(self.counter_key("seq"), 1u64)
            .await
            .map_err(|e| redis_error("INCR", e))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| redis_error("PING", e))?;

        Ok(())
    }
}
