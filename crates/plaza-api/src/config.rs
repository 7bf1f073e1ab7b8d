use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub upload_dir: String,
    pub session_secret: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub oauth_redirect_url: String,
    pub emoji_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("PLAZA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("PLAZA_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| "Invalid PLAZA_PORT")?;

        let database_path =
            env::var("PLAZA_DB_PATH").unwrap_or_else(|_| "./plaza.db".to_string());

        let upload_dir = env::var("PLAZA_UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let session_secret =
            env::var("PLAZA_SESSION_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());

        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| "GOOGLE_CLIENT_ID must be set for sign-in")?;
        let google_client_secret = env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| "GOOGLE_CLIENT_SECRET must be set for sign-in")?;

        let oauth_redirect_url = env::var("PLAZA_OAUTH_REDIRECT")
            .unwrap_or_else(|_| format!("http://localhost:{server_port}/auth/google/callback"));

        let emoji_api_key = env::var("EMOJI_API_KEY").ok();

        Ok(Config {
            server_host,
            server_port,
            database_path,
            upload_dir,
            session_secret,
            google_client_id,
            google_client_secret,
            oauth_redirect_url,
            emoji_api_key,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
