//! Redis-backed [`KvStore`] for shared, multi-instance deployments.

// crates.io
use ::redis::{AsyncCommands, Client, RedisError, Script, aio::ConnectionManager};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	store::{KvStore, StoreError, StoreFuture, ttl_millis},
};

// INCR and the conditional PEXPIRE run as one script: a freshly created counter always carries
// an expiry.
const INCREMENT_SCRIPT: &str = r"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
	redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return current
";

/// Store backed by a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisStore {
	conn: ConnectionManager,
	increment: Script,
}
impl RedisStore {
	/// Opens a connection manager for `url` (e.g. `redis://127.0.0.1:6379/0`).
	pub async fn connect(url: &str) -> Result<Self, ConfigError> {
		let client = Client::open(url)
			.map_err(|e| ConfigError::StoreClient { message: format!("Invalid Redis URL: {e}") })?;
		let conn = ConnectionManager::new(client).await.map_err(|e| ConfigError::StoreClient {
			message: format!("Failed to create Redis connection manager: {e}"),
		})?;

		Ok(Self::with_connection(conn))
	}

	/// Wraps an existing connection manager.
	pub fn with_connection(conn: ConnectionManager) -> Self {
		Self { conn, increment: Script::new(INCREMENT_SCRIPT) }
	}
}
impl Debug for RedisStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RedisStore(..)")
	}
}
impl KvStore for RedisStore {
	fn increment<'a>(&'a self, key: &'a str, ttl_if_created: Duration) -> StoreFuture<'a, u64> {
		let mut conn = self.conn.clone();

		Box::pin(async move {
			let ttl_ms = ttl_millis(ttl_if_created)?;
			let current: u64 =
				self.increment.key(key).arg(ttl_ms).invoke_async(&mut conn).await?;

			Ok(current)
		})
	}

	fn set_with_expiry<'a>(
		&'a self,
		key: &'a str,
		value: &'a str,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		let mut conn = self.conn.clone();

		Box::pin(async move {
			let ttl_ms = ttl_millis(ttl)?;
			let _: () = conn.pset_ex(key, value, ttl_ms).await?;

			Ok(())
		})
	}

	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let mut conn = self.conn.clone();

		Box::pin(async move {
			let value: Option<String> = conn.get(key).await?;

			Ok(value)
		})
	}

	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		let mut conn = self.conn.clone();

		Box::pin(async move {
			let present: bool = conn.exists(key).await?;

			Ok(present)
		})
	}

	fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>> {
		let mut conn = self.conn.clone();

		Box::pin(async move {
			let millis: i64 = conn.pttl(key).await?;

			// -2: missing key, -1: key without expiry.
			Ok((millis >= 0).then(|| Duration::milliseconds(millis)))
		})
	}
}

impl From<RedisError> for StoreError {
	fn from(e: RedisError) -> Self {
		let message = e.to_string();

		if e.is_timeout()
			|| e.is_connection_refusal()
			|| e.is_connection_dropped()
			|| e.is_io_error()
		{
			StoreError::Unavailable { message }
		} else if matches!(e.kind(), ::redis::ErrorKind::TypeError) {
			StoreError::Serialization { message }
		} else {
			StoreError::Backend { message }
		}
	}
}
