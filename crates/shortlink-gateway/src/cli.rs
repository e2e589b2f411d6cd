use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "SHORTLINK_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "SHORTLINK_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SHORTLINK_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "SHORTLINK_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "SHORTLINK_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "SHORTLINK_REDIS_URL";
pub const API_KEYS_ENV: &str = "SHORTLINK_API_KEYS";
pub const RATE_LIMIT_CAPACITY_ENV: &str = "SHORTLINK_RATE_LIMIT_CAPACITY";
pub const RATE_LIMIT_REFILL_ENV: &str = "SHORTLINK_RATE_LIMIT_REFILL_PER_SECOND";
pub const BLOOM_EXPECTED_ITEMS_ENV: &str = "SHORTLINK_BLOOM_EXPECTED_ITEMS";
pub const BLOOM_FALSE_POSITIVE_RATE_ENV: &str = "SHORTLINK_BLOOM_FALSE_POSITIVE_RATE";
pub const WARM_FILTER_ENV: &str = "SHORTLINK_WARM_FILTER";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_API_KEY: &str = "test-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::InMemory => write!(f, "in-memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shortlink-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of every issued short URL.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::InMemory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    /// Keys accepted in the `X-API-Key` header, comma separated.
    #[arg(
        long,
        env = API_KEYS_ENV,
        value_delimiter = ',',
        default_value = DEFAULT_API_KEY
    )]
    pub api_keys: Vec<String>,

    #[arg(long, env = RATE_LIMIT_CAPACITY_ENV, default_value_t = 1000)]
    pub rate_limit_capacity: u32,

    #[arg(long, env = RATE_LIMIT_REFILL_ENV, default_value_t = 100)]
    pub rate_limit_refill_per_second: u32,

    #[arg(long, env = BLOOM_EXPECTED_ITEMS_ENV, default_value_t = 1_000_000)]
    pub bloom_expected_items: u64,

    #[arg(long, env = BLOOM_FALSE_POSITIVE_RATE_ENV, default_value_t = 0.01)]
    pub bloom_false_positive_rate: f64,

    /// Seed the membership filter from the store before serving.
    #[arg(long, env = WARM_FILTER_ENV, action = ArgAction::Set, default_value_t = true)]
    pub warm_filter: bool,
}

impl CLI {
    /// Rejects backend combinations that would break the membership filter.
    ///
    /// The filter's bits live next to the cache: in Redis for `--cache redis`,
    /// inside the process otherwise. A store shared between gateways needs
    /// the shared bit array, or a link created on one gateway is ruled out by
    /// the filter of every other gateway.
    pub fn check_backends(&self) -> Result<(), clap::Error> {
        if self.storage == StorageBackendArg::Mysql && self.cache == CacheBackendArg::InMemory {
            return Err(CLI::command().error(
                ErrorKind::ArgumentConflict,
                "--storage mysql requires --cache redis so every gateway shares one membership filter",
            ));
        }
        Ok(())
    }
}
