use std::env;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
}

/// Catalog behaviour knobs shared by the category and review services
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// What a product's rating becomes once its last active review is gone
    pub empty_rating_policy: EmptyRatingPolicy,
    /// Decimal places kept when rounding the mean grade
    pub rating_precision: u32,
    /// Optional JSON document used to seed the in-memory store
    pub seed_path: Option<String>,
    /// Category printed by the binary; the whole forest when unset
    pub root_slug: Option<String>,
}

/// Policy applied when a product has no active reviews left to average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyRatingPolicy {
    /// Rating drops back to 0.0, the value every new product starts with
    #[default]
    Reset,
    /// Rating keeps whatever value was last stored
    Keep,
    /// Recomputation fails with a consistency error and the change is rolled back
    Reject,
}

impl FromStr for EmptyRatingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "keep" => Ok(Self::Keep),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "EMPTY_RATING_POLICY must be one of reset, keep, reject (got '{}')",
                other
            )),
        }
    }
}

impl fmt::Display for EmptyRatingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Reset => "reset",
            Self::Keep => "keep",
            Self::Reject => "reject",
        };
        f.write_str(s)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            catalog: CatalogConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let name = env::var("APP_NAME").unwrap_or_else(|_| "storefront-core".to_string());

        Ok(Self { name })
    }
}

impl CatalogConfig {
    pub const DEFAULT_RATING_PRECISION: u32 = 2;
    const MAX_RATING_PRECISION: u32 = 6;

    pub fn from_env() -> Result<Self, String> {
        let empty_rating_policy = env::var("EMPTY_RATING_POLICY")
            .unwrap_or_else(|_| EmptyRatingPolicy::default().to_string())
            .parse::<EmptyRatingPolicy>()?;

        let rating_precision = env::var("RATING_PRECISION")
            .unwrap_or_else(|_| Self::DEFAULT_RATING_PRECISION.to_string())
            .parse::<u32>()
            .map_err(|_| "RATING_PRECISION must be a valid number".to_string())?;

        if rating_precision > Self::MAX_RATING_PRECISION {
            return Err(format!(
                "RATING_PRECISION must not exceed {}",
                Self::MAX_RATING_PRECISION
            ));
        }

        // Only use paths and slugs if they are non-empty
        let seed_path = env::var("CATALOG_SEED_PATH").ok().filter(|s| !s.is_empty());
        let root_slug = env::var("CATALOG_ROOT_SLUG").ok().filter(|s| !s.is_empty());

        Ok(Self {
            empty_rating_policy,
            rating_precision,
            seed_path,
            root_slug,
        })
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            empty_rating_policy: EmptyRatingPolicy::default(),
            rating_precision: Self::DEFAULT_RATING_PRECISION,
            seed_path: None,
            root_slug: None,
        }
    }
}
