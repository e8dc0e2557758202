use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Parser, Debug)]
#[command(name = "scribe", about = "A small server-rendered blog")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Create an admin account from the command line
    CreateSuperuser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    /// bcrypt work factor for stored passwords
    pub bcrypt_cost: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "scribe_session".to_string(),
            session_hours: 720,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("scribe.db"));
        }

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&config.auth.bcrypt_cost) {
            anyhow::bail!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST
            );
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir.clone() {
            Some(dir) => Ok(dir),
            None => dirs::home_dir()
                .map(|home| home.join(".scribe"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    /// Database file; falls back to the working directory when the config was
    /// built by hand rather than through [`Config::load`].
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("scribe.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(data_dir: Option<PathBuf>) -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            data_dir,
            command: None,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.cookie_name, "scribe_session");
        assert_eq!(config.auth.session_hours, 720);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli_with(Some(PathBuf::from("/tmp/test-scribe")));
        assert_eq!(
            Config::data_dir(&cli).unwrap(),
            PathBuf::from("/tmp/test-scribe")
        );
    }

    #[test]
    fn data_dir_defaults_to_home_dot_scribe() {
        let cli = cli_with(None);
        if let Ok(dir) = Config::data_dir(&cli) {
            assert!(dir.ends_with(".scribe"));
        }
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = cli_with(Some(tmp.path().to_path_buf()));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.db_path(), tmp.path().join("scribe.db"));
    }

    #[test]
    fn load_applies_cli_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            host: Some("127.0.0.1".to_string()),
            port: Some(8080),
            ..cli_with(Some(tmp.path().to_path_buf()))
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000

[auth]
cookie_name = "my_cookie"
session_hours = 24
bcrypt_cost = 6
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli_with(Some(tmp.path().to_path_buf()))
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.cookie_name, "my_cookie");
        assert_eq!(config.auth.session_hours, 24);
        assert_eq!(config.auth.bcrypt_cost, 6);
    }

    #[test]
    fn load_rejects_out_of_range_bcrypt_cost() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[auth]\nbcrypt_cost = 2\n").unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli_with(Some(tmp.path().to_path_buf()))
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: Some("10.0.0.1".to_string()),
            port: Some(4000),
            ..cli_with(Some(tmp.path().to_path_buf()))
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn subcommand_parses_create_superuser() {
        let cli = Cli::parse_from([
            "scribe",
            "create-superuser",
            "--username",
            "admin",
            "--email",
            "admin@example.com",
            "--password",
            "s3cret-pass",
        ]);
        assert_eq!(
            cli.command,
            Some(Command::CreateSuperuser {
                username: "admin".into(),
                email: "admin@example.com".into(),
                password: "s3cret-pass".into(),
            })
        );
    }
}
