//! Client for the host application's REST API.
//!
//! Every call runs the session gate first, then issues one request and maps
//! the response into domain entities. Nothing is retried.

pub mod auth;
pub mod error;
pub mod mapping;
pub mod models;


pub use auth::{AuthGate, SessionCredentials, DEFAULT_AUTH_TTL};
pub use error::ApiError;

use crate::core::models::{
    Conversation, ConversationUpdate, Folder, FolderUpdate, NewPrompt, Prompt, PromptUpdate,
    UserProfile,
};
use crate::utils::url::{construct_api_url, parse_base_url, with_path_segment};
use mapping::{
    map_conversation_from_api, map_folder_from_api, map_prompt_from_api, map_session_from_api,
};
use models::{CreateConversationRequest, CreateFolderRequest, ListPayload, RawSession};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CONVERSATIONS: &str = "conversations";
const FOLDERS: &str = "folders";
const PROMPTS: &str = "prompts";
const SESSION: &str = "auth/session";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub credentials: Option<SessionCredentials>,
    pub auth_ttl: Duration,
    pub request_timeout: Duration,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: None,
            auth_ttl: DEFAULT_AUTH_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_credentials(mut self, credentials: SessionCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    gate: AuthGate,
}

/// Which entity a request addresses; used for `NotFound` and `Mapping` errors.
#[derive(Clone, Copy)]
struct Resource {
    collection: &'static str,
    entity: &'static str,
}

const CONVERSATION: Resource = Resource {
    collection: CONVERSATIONS,
    entity: "conversation",
};
const FOLDER: Resource = Resource {
    collection: FOLDERS,
    entity: "folder",
};
const PROMPT: Resource = Resource {
    collection: PROMPTS,
    entity: "prompt",
};

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base_url =
            parse_base_url(&settings.base_url).map_err(|reason| ApiError::InvalidBaseUrl {
                url: settings.base_url.clone(),
                reason,
            })?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            gate: AuthGate::new(settings.credentials, settings.auth_ttl),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth_gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Runs the session gate without issuing a data request.
    pub async fn ensure_authenticated(&self) -> Result<(), ApiError> {
        self.gate.check(&self.http, self.endpoint(SESSION)?).await
    }

    /// Fetches the signed-in user. Always probes the remote, and refreshes
    /// the gate on success.
    pub async fn get_session(&self) -> Result<UserProfile, ApiError> {
        let credentials = self.gate.require_credentials()?;
        let url = self.endpoint(SESSION)?;
        let response = credentials
            .apply(self.http.get(url.clone()))
            .send()
            .await?;
        let status = response.status();
        debug!(method = "GET", url = %url, status = status.as_u16(), "API request");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.gate.invalidate();
            return Err(ApiError::Authentication(format!(
                "session rejected with status {}",
                status.as_u16()
            )));
        }
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::from_response(
                status.as_u16(),
                status.canonical_reason(),
                &body,
            ));
        }
        self.gate.mark_verified();
        let raw: RawSession = decode("session", &body)?;
        Ok(map_session_from_api(raw))
    }

    pub async fn get_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.fetch_list(CONVERSATION, map_conversation_from_api)
            .await
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Conversation, ApiError> {
        self.fetch_one(CONVERSATION, id, map_conversation_from_api)
            .await
    }

    pub async fn create_conversation(&self, title: &str) -> Result<Conversation, ApiError> {
        self.create(
            CONVERSATION,
            &CreateConversationRequest { title },
            map_conversation_from_api,
        )
        .await
    }

    /// Sends `update` as-is; the remote decides how to merge it.
    pub async fn update_conversation(
        &self,
        id: &str,
        update: &ConversationUpdate,
    ) -> Result<Conversation, ApiError> {
        self.update(CONVERSATION, id, update, map_conversation_from_api)
            .await
    }

    pub async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        self.delete(CONVERSATION, id).await
    }

    pub async fn get_folders(&self) -> Result<Vec<Folder>, ApiError> {
        self.fetch_list(FOLDER, map_folder_from_api).await
    }

    pub async fn get_folder(&self, id: &str) -> Result<Folder, ApiError> {
        self.fetch_one(FOLDER, id, map_folder_from_api).await
    }

    pub async fn create_folder(&self, name: &str, color: Option<&str>) -> Result<Folder, ApiError> {
        self.create(
            FOLDER,
            &CreateFolderRequest { name, color },
            map_folder_from_api,
        )
        .await
    }

    pub async fn update_folder(&self, id: &str, update: &FolderUpdate) -> Result<Folder, ApiError> {
        self.update(FOLDER, id, update, map_folder_from_api).await
    }

    pub async fn delete_folder(&self, id: &str) -> Result<(), ApiError> {
        self.delete(FOLDER, id).await
    }

    pub async fn get_prompts(&self) -> Result<Vec<Prompt>, ApiError> {
        self.fetch_list(PROMPT, map_prompt_from_api).await
    }

    pub async fn get_prompt(&self, id: &str) -> Result<Prompt, ApiError> {
        self.fetch_one(PROMPT, id, map_prompt_from_api).await
    }

    pub async fn create_prompt(&self, prompt: &NewPrompt) -> Result<Prompt, ApiError> {
        self.create(PROMPT, prompt, map_prompt_from_api).await
    }

    pub async fn update_prompt(&self, id: &str, update: &PromptUpdate) -> Result<Prompt, ApiError> {
        self.update(PROMPT, id, update, map_prompt_from_api).await
    }

    pub async fn delete_prompt(&self, id: &str) -> Result<(), ApiError> {
        self.delete(PROMPT, id).await
    }

    async fn fetch_list<R, T>(
        &self,
        resource: Resource,
        map: fn(R) -> T,
    ) -> Result<Vec<T>, ApiError>
    where
        R: DeserializeOwned,
    {
        let url = self.endpoint(resource.collection)?;
        let (status, body) = self.send(Method::GET, url, None::<&()>).await?;
        ensure_success(status, &body, None)?;
        let payload: ListPayload<R> = decode(resource.entity, &body)?;
        Ok(payload.into_items().into_iter().map(map).collect())
    }

    async fn fetch_one<R, T>(
        &self,
        resource: Resource,
        id: &str,
        map: fn(R) -> T,
    ) -> Result<T, ApiError>
    where
        R: DeserializeOwned,
    {
        let url = self.item_endpoint(resource, id)?;
        let (status, body) = self.send(Method::GET, url, None::<&()>).await?;
        ensure_success(status, &body, Some((resource.entity, id)))?;
        Ok(map(decode(resource.entity, &body)?))
    }

    async fn create<B, R, T>(
        &self,
        resource: Resource,
        payload: &B,
        map: fn(R) -> T,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(resource.collection)?;
        let (status, body) = self.send(Method::POST, url, Some(payload)).await?;
        ensure_success(status, &body, None)?;
        Ok(map(decode(resource.entity, &body)?))
    }

    /// PATCHes the item. A bodiless success is followed by a GET so callers
    /// always receive the updated entity.
    async fn update<B, R, T>(
        &self,
        resource: Resource,
        id: &str,
        payload: &B,
        map: fn(R) -> T,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.item_endpoint(resource, id)?;
        let (status, body) = self.send(Method::PATCH, url, Some(payload)).await?;
        ensure_success(status, &body, Some((resource.entity, id)))?;
        if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
            return self.fetch_one(resource, id, map).await;
        }
        Ok(map(decode(resource.entity, &body)?))
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        let url = self.item_endpoint(resource, id)?;
        let (status, body) = self.send(Method::DELETE, url, None::<&()>).await?;
        ensure_success(status, &body, Some((resource.entity, id)))
    }

    /// Passes the gate, then sends one request. A 401 drops the cached
    /// session confirmation.
    async fn send<B>(
        &self,
        method: Method,
        url: Url,
        payload: Option<&B>,
    ) -> Result<(StatusCode, Vec<u8>), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.ensure_authenticated().await?;
        let credentials = self.gate.require_credentials()?;

        let mut request = credentials.apply(self.http.request(method.clone(), url.clone()));
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        let response = request.send().await?;
        let status = response.status();
        debug!(method = %method, url = %url, status = status.as_u16(), "API request");

        if status == StatusCode::UNAUTHORIZED {
            self.gate.invalidate();
        }
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = construct_api_url(self.base_url.as_str(), path);
        Url::parse(&joined).map_err(|err| ApiError::InvalidBaseUrl {
            url: joined,
            reason: err.to_string(),
        })
    }

    fn item_endpoint(&self, resource: Resource, id: &str) -> Result<Url, ApiError> {
        Ok(with_path_segment(self.endpoint(resource.collection)?, id))
    }
}

fn ensure_success(
    status: StatusCode,
    body: &[u8],
    item: Option<(&'static str, &str)>,
) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::NOT_FOUND {
        if let Some((entity, id)) = item {
            return Err(ApiError::NotFound {
                entity,
                id: id.to_string(),
            });
        }
    }
    Err(ApiError::from_response(
        status.as_u16(),
        status.canonical_reason(),
        body,
    ))
}

fn decode<R: DeserializeOwned>(entity: &'static str, body: &[u8]) -> Result<R, ApiError> {
    serde_json::from_slice(body).map_err(|source| ApiError::Mapping { entity, source })
}
