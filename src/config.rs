#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the service on the in-memory demo store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub razorpay_key_id: String,
    pub razorpay_webhook_secret: String,
    pub payment_currency: String,
    pub log_level: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");

        let jwt_maxage = env_or("JWT_MAXAGE", "60")
            .parse::<i64>()
            .expect("JWT_MAXAGE must be a number of minutes");
        let port = env_or("PORT", "8000")
            .parse::<u16>()
            .expect("PORT must be a valid port number");
        let db_max_connections = env_or("DB_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .expect("DB_MAX_CONNECTIONS must be a number");

        let allowed_origins = env_or("ALLOWED_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        // Payment gateway (webhooks are refused while the secret is empty)
        let razorpay_key_id = env_or("RAZORPAY_KEY_ID", "");
        let razorpay_webhook_secret = env_or("RAZORPAY_WEBHOOK_SECRET", "");
        let payment_currency = env_or("PAYMENT_CURRENCY", "INR");

        let log_level = env_or("LOG_LEVEL", "debug");

        Config {
            database_url,
            db_max_connections,
            jwt_secret,
            jwt_maxage,
            port,
            allowed_origins,
            razorpay_key_id,
            razorpay_webhook_secret,
            payment_currency,
            log_level,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
