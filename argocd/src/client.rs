use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::error::{ArgoError, Result};
use crate::models::{
    Project, ProjectCreateRequest, ProjectList, SessionRequest, SessionResponse,
};
use crate::{CreateOutcome, ProjectService};

const SESSION_PATH: &str = "/api/v1/session";
const PROJECTS_PATH: &str = "/api/v1/projects";

/// An Argo CD API session holding a bearer token
pub struct ArgoClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for ArgoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgoClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ArgoClient {
    /// Log in once with username/password and keep the returned token
    #[instrument(skip(password))]
    pub async fn login(host: &str, username: &str, password: &str) -> Result<Self> {
        let http = reqwest::Client::new();
        let base_url = host.trim_end_matches('/').to_string();
        let url = format!("{}{}", base_url, SESSION_PATH);

        debug!(url = %url, "Requesting Argo CD session");

        let response = http
            .post(&url)
            .json(&SessionRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArgoError::Auth {
                status: status.as_u16(),
                message: response_message(response).await,
            });
        }

        let session: SessionResponse = decode(response, SESSION_PATH).await?;

        info!("Logged in to Argo CD");
        Ok(Self {
            http,
            base_url,
            token: session.token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ProjectService for ArgoClient {
    #[instrument(skip(self))]
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let response = self
            .http
            .get(self.url(PROJECTS_PATH))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = ensure_success(response, PROJECTS_PATH).await?;
        let list: ProjectList = decode(response, PROJECTS_PATH).await?;
        let projects = list.items.unwrap_or_default();

        debug!(count = projects.len(), "Listed Argo CD projects");
        Ok(projects)
    }

    #[instrument(skip(self, project), fields(project = %project.name()))]
    async fn create_project(&self, project: &Project) -> Result<CreateOutcome> {
        let response = self
            .http
            .post(self.url(PROJECTS_PATH))
            .bearer_auth(&self.token)
            .json(&ProjectCreateRequest {
                project,
                upsert: false,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Created Argo CD project");
            return Ok(CreateOutcome::Created);
        }

        let body = ApiErrorBody::parse(&response.text().await.unwrap_or_default());
        if body.is_name_collision(status) {
            warn!(message = %body.message, "Project already exists, leaving it untouched");
            return Ok(CreateOutcome::AlreadyExists);
        }

        Err(ArgoError::Api {
            endpoint: PROJECTS_PATH.to_string(),
            status: status.as_u16(),
            message: body.message,
        })
    }
}

/// gRPC status codes Argo CD embeds in error bodies
const GRPC_INVALID_ARGUMENT: i64 = 3;
const GRPC_ALREADY_EXISTS: i64 = 6;

/// Argo CD's gRPC-gateway error body: `{"error", "code", "message"}`
#[derive(Debug)]
struct ApiErrorBody {
    code: Option<i64>,
    message: String,
}

impl ApiErrorBody {
    fn parse(body: &str) -> Self {
        let json = serde_json::from_str::<serde_json::Value>(body).ok();
        let code = json.as_ref().and_then(|v| v.get("code")).and_then(|c| c.as_i64());
        let message = json
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        Self { code, message }
    }

    /// Without upsert, Argo CD answers a create for an existing project with
    /// AlreadyExists when the specs match and InvalidArgument when they differ
    fn is_name_collision(&self, status: StatusCode) -> bool {
        if status == StatusCode::CONFLICT || self.code == Some(GRPC_ALREADY_EXISTS) {
            return true;
        }
        (status == StatusCode::BAD_REQUEST || self.code == Some(GRPC_INVALID_ARGUMENT))
            && self.message.starts_with("existing project")
    }
}

async fn ensure_success(response: Response, endpoint: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ArgoError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: response_message(response).await,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ArgoError::Decode {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

/// Best-effort error text: Argo CD's `{"message": ...}` if present, else the raw body
async fn response_message(response: Response) -> String {
    ApiErrorBody::parse(&response.text().await.unwrap_or_default()).message
}
