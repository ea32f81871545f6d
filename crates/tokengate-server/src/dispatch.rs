//! Turn parsed arguments into an [`Action`] and run it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use tokengate_auth::config::{AuthConfig, KeyAlgorithm};
use tokengate_auth::exter::{ExterClient, ExterClientConfig};
use tokengate_auth::password;
use tokengate_auth::service::AuthService;
use tokengate_store::{MemoryUserRepository, load_seed_file};
use tracing::info;

use crate::api::{Api, ApiContext, ApiResult, AppInfo, ExterInfo, LoginParams, VerifyParams};

/// Settings shared by every API-backed action.
#[derive(Debug, Clone)]
pub struct Settings {
    pub private_key: Option<PathBuf>,
    pub public_key: Option<PathBuf>,
    pub algorithm: KeyAlgorithm,
    pub issuer: String,
    pub session_lifetime_secs: u64,
    pub users: Option<PathBuf>,
    pub exter_base_url: Option<String>,
    pub exter_app_id: String,
    pub exter_public_key: Option<PathBuf>,
    pub exter_algorithm: KeyAlgorithm,
    pub exter_timeout: Duration,
    pub debug_tokens: bool,
    pub expose_exter_errors: bool,
}

#[derive(Debug)]
pub enum Action {
    Info(Settings),
    Login(Settings, LoginParams),
    Verify(Settings, VerifyParams),
    HashPassword { user_id: String, password: String },
}

fn string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn algorithm(matches: &ArgMatches, id: &str) -> Result<KeyAlgorithm> {
    let raw = string(matches, id).unwrap_or_default();
    raw.parse::<KeyAlgorithm>()
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("invalid --{id}"))
}

fn settings(matches: &ArgMatches) -> Result<Settings> {
    Ok(Settings {
        private_key: string(matches, "private-key").map(PathBuf::from),
        public_key: string(matches, "public-key").map(PathBuf::from),
        algorithm: algorithm(matches, "algorithm")?,
        issuer: string(matches, "issuer").unwrap_or_else(|| "tokengate".into()),
        session_lifetime_secs: matches
            .get_one::<u64>("session-lifetime")
            .copied()
            .unwrap_or(3600),
        users: string(matches, "users").map(PathBuf::from),
        exter_base_url: string(matches, "exter-base-url"),
        exter_app_id: string(matches, "exter-app-id").unwrap_or_default(),
        exter_public_key: string(matches, "exter-public-key").map(PathBuf::from),
        exter_algorithm: algorithm(matches, "exter-algorithm")?,
        exter_timeout: Duration::from_millis(
            matches
                .get_one::<u64>("exter-timeout")
                .copied()
                .unwrap_or(10_000),
        ),
        debug_tokens: matches.get_flag("debug-tokens"),
        expose_exter_errors: matches.get_flag("expose-exter-errors"),
    })
}

/// Map parsed arguments to the [`Action`] to run.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("missing subcommand")?;
    match name {
        "info" => Ok(Action::Info(settings(sub)?)),
        "login" => Ok(Action::Login(
            settings(sub)?,
            LoginParams {
                mode: string(sub, "mode").unwrap_or_default(),
                username: string(sub, "username").unwrap_or_default(),
                password: sub.get_one::<String>("password").cloned().unwrap_or_default(),
                token: string(sub, "token").unwrap_or_default(),
            },
        )),
        "verify" => Ok(Action::Verify(
            settings(sub)?,
            VerifyParams {
                token: string(sub, "token").unwrap_or_default(),
            },
        )),
        "hash-password" => Ok(Action::HashPassword {
            user_id: string(sub, "user-id").context("missing required argument: --user-id")?,
            password: sub
                .get_one::<String>("password")
                .cloned()
                .context("missing required argument: --password")?,
        }),
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}

async fn read_pem(path: &Path, what: &str) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {what} from {}", path.display()))
}

/// Load keys and users and wire the API.
///
/// # Errors
/// Returns an error if a file cannot be read or the configuration is invalid.
pub async fn build_api(settings: &Settings) -> Result<Api<MemoryUserRepository>> {
    let private_key = settings
        .private_key
        .as_ref()
        .context("missing required argument: --private-key")?;
    let public_key = settings
        .public_key
        .as_ref()
        .context("missing required argument: --public-key")?;

    let exter_public_key_pem = match &settings.exter_public_key {
        Some(path) => Some(read_pem(path, "exter public key").await?),
        None => None,
    };

    let config = AuthConfig {
        signing_algorithm: settings.algorithm,
        jwt_private_key_pem: read_pem(private_key, "private key").await?,
        jwt_public_key_pem: read_pem(public_key, "public key").await?,
        jwt_issuer: settings.issuer.clone(),
        form_session_lifetime_secs: settings.session_lifetime_secs,
        exter_public_key_pem,
        exter_key_algorithm: settings.exter_algorithm,
        exter_timeout: settings.exter_timeout,
        debug_token_logging: settings.debug_tokens,
        expose_exter_errors: settings.expose_exter_errors,
    };

    let repo = match &settings.users {
        Some(path) => {
            let users = load_seed_file(path)
                .await
                .with_context(|| format!("failed to load users from {}", path.display()))?;
            MemoryUserRepository::with_users(users)
                .await
                .context("invalid users file")?
        }
        None => MemoryUserRepository::new(),
    };
    info!(users = repo.len().await, "User store ready");

    let service = AuthService::new(repo, config).context("invalid authentication settings")?;

    let (service, exter) = match &settings.exter_base_url {
        Some(base_url) => {
            let client = ExterClient::new(&ExterClientConfig {
                base_url: base_url.clone(),
                app_id: settings.exter_app_id.clone(),
                timeout: settings.exter_timeout,
                ..ExterClientConfig::default()
            })
            .context("invalid exter settings")?;
            let exter = ExterInfo::from(&client);
            info!(endpoint = %client.endpoint(), app_id = %client.app_id(), "Exter login enabled");
            (service.with_exter(client), exter)
        }
        None => (service, ExterInfo::default()),
    };

    Ok(Api::new(Arc::new(service), AppInfo::default(), exter))
}

impl Action {
    /// Run the action and return the JSON to print plus whether it succeeded.
    ///
    /// # Errors
    /// Returns an error if the API cannot be built.
    pub async fn execute(self) -> Result<(String, bool)> {
        let result = match self {
            Action::HashPassword { user_id, password } => {
                let hash = password::hash_password(&user_id, &password)
                    .context("failed to hash password")?;
                return Ok((hash, true));
            }
            Action::Info(settings) => build_api(&settings).await?.info(&ApiContext::new()),
            Action::Login(settings, params) => {
                build_api(&settings)
                    .await?
                    .login(&ApiContext::new(), params)
                    .await
            }
            Action::Verify(settings, params) => {
                build_api(&settings)
                    .await?
                    .verify_login_token(&ApiContext::new(), params)
                    .await
            }
        };
        render(&result)
    }
}

fn render(result: &ApiResult) -> Result<(String, bool)> {
    let json = serde_json::to_string_pretty(result).context("failed to render result")?;
    Ok((json, result.is_ok()))
}
