//! Redis helpers: the revoked-token deny-list and the recommendation cache.

use redis::aio::MultiplexedConnection;
use redis::{Client as RedisClient, RedisError};
use uuid::Uuid;

async fn connection(client: &RedisClient) -> Result<MultiplexedConnection, RedisError> {
    client.get_multiplexed_async_connection().await
}

pub fn revoked_token_key(jti: Uuid) -> String {
    format!("auth:revoked:{jti}")
}

pub async fn revoke_token(client: &RedisClient, jti: Uuid, ttl_secs: u64) -> Result<(), RedisError> {
    // A zero TTL is rejected by Redis; the token is already expired in that case.
    if ttl_secs == 0 {
        return Ok(());
    }
    let mut con = connection(client).await?;
    redis::cmd("SET")
        .arg(revoked_token_key(jti))
        .arg(1)
        .arg("EX")
        .arg(ttl_secs)
        .query_async::<_, ()>(&mut con)
        .await
}

pub async fn is_token_revoked(client: &RedisClient, jti: Uuid) -> Result<bool, RedisError> {
    let mut con = connection(client).await?;
    redis::cmd("EXISTS")
        .arg(revoked_token_key(jti))
        .query_async::<_, bool>(&mut con)
        .await
}

pub async fn get_string(client: &RedisClient, key: &str) -> Result<Option<String>, RedisError> {
    let mut con = connection(client).await?;
    redis::cmd("GET")
        .arg(key)
        .query_async::<_, Option<String>>(&mut con)
        .await
}

pub async fn set_string_ex(
    client: &RedisClient,
    key: &str,
    value: &str,
    ttl_secs: u64,
) -> Result<(), RedisError> {
    let mut con = connection(client).await?;
    redis::cmd("SET")
        .arg(key)
        .arg(value)
        .arg("EX")
        .arg(ttl_secs.max(1))
        .query_async::<_, ()>(&mut con)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoked_token_key_format() {
        let jti = Uuid::nil();
        assert_eq!(
            revoked_token_key(jti),
            "auth:revoked:00000000-0000-0000-0000-000000000000"
        );
    }
}
