use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    /// 未配置时使用内存存储
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub draw: DrawConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawConfig {
    /// 提交冲突 (并发修改) 时的最大尝试次数
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,
    /// 中奖记录的默认备注
    #[serde(default = "default_note")]
    pub default_note: String,
}

fn default_max_connections() -> u32 {
    10
}

fn default_max_commit_attempts() -> u32 {
    3
}

fn default_note() -> String {
    "automatic draw".to_string()
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: default_max_commit_attempts(),
            default_note: default_note(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            // 无配置文件：使用默认值, 之后由环境变量覆盖
            Err(e) if e.kind() == ErrorKind::NotFound => Config {
                server: ServerConfig::default(),
                database: None,
                draw: DrawConfig::default(),
            },
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Cannot read config file {config_path}: {e}"
                )));
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))?;
        if config.draw.max_commit_attempts == 0 {
            return Err(AppError::ConfigError(
                "draw.max_commit_attempts must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    // 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            match self.database.as_mut() {
                Some(db) => db.url = v,
                None => {
                    self.database = Some(DatabaseConfig {
                        url: v,
                        max_connections: default_max_connections(),
                    })
                }
            }
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
            && let Some(db) = self.database.as_mut()
        {
            db.max_connections = mc;
        }
        if let Ok(v) = env::var("DRAW_MAX_COMMIT_ATTEMPTS")
            && let Ok(n) = v.parse::<u32>()
            && n > 0
        {
            self.draw.max_commit_attempts = n;
        }
        if let Ok(v) = env::var("DRAW_DEFAULT_NOTE") {
            self.draw.default_note = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.database.is_none());
        assert_eq!(config.draw.max_commit_attempts, 3);
        assert_eq!(config.draw.default_note, "automatic draw");
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/giveaway"

            [draw]
            max_commit_attempts = 5
            default_note = "live draw"
            "#,
        )
        .unwrap();
        let db = config.database.unwrap();
        assert_eq!(db.url, "postgres://localhost/giveaway");
        assert_eq!(db.max_connections, 10);
        assert_eq!(config.draw.max_commit_attempts, 5);
        assert_eq!(config.draw.default_note, "live draw");
    }

    #[test]
    fn test_parse_rejects_zero_attempts() {
        let result = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [draw]
            max_commit_attempts = 0
            "#,
        );
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_parse_rejects_malformed_toml() {
        let result = Config::parse("[server\nhost = ");
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
