use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::api::{build_client, check_status};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Google,
    Apple,
}

impl Provider {
    fn path(&self) -> &'static str {
        match self {
            Provider::Google => "auth/google",
            Provider::Apple => "auth/apple",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    object_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
    user: AuthUser,
}

impl AuthResponse {
    fn into_session(self) -> Result<Session> {
        let user = self.user;
        let user_id = user
            .id
            .or(user.object_id)
            .or(user.user_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(Error::NoUserIdentifier)?;
        Ok(Session {
            user_id,
            token: self.token,
            name: user.name,
            email: user.email,
        })
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ProviderToken<'a> {
    token: &'a str,
}

/// Client for the `/auth` endpoints. Every call yields a fresh `Session`.
#[derive(Clone, Debug)]
pub struct AuthApi {
    client: Client,
    base_url: String,
}

impl AuthApi {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(AuthApi::with_client(build_client(config)?, &config.api_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        AuthApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Session> {
        let url = format!("{}/{}", self.base_url, path);
        let res = self.client.post(&url).json(body).send().await?;
        let session = check_status(res)
            .await?
            .json::<AuthResponse>()
            .await?
            .into_session()?;
        log::info!("signed in as user {} via {}", session.user_id, path);
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        self.post(
            "auth/login",
            &Credentials {
                name: None,
                email,
                password,
            },
        )
        .await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        self.post(
            "auth/register",
            &Credentials {
                name: Some(name),
                email,
                password,
            },
        )
        .await
    }

    /// Exchanges a token already issued by the identity provider.
    pub async fn sign_in_with(&self, provider: Provider, token: &str) -> Result<Session> {
        self.post(provider.path(), &ProviderToken { token }).await
    }
}
