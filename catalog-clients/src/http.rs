//! Small shared layer over reqwest: bearer injection, status mapping and
//! decode errors that keep the offending URL and body.

use serde::de::DeserializeOwned;
use serde_json::Value;

use transfer_gcp_auth::SharedTokenProvider;

use crate::USER_AGENT;
use crate::error::ApiError;

pub(crate) struct RestClient {
    http: reqwest::Client,
    tokens: SharedTokenProvider,
}

impl RestClient {
    pub(crate) fn new(tokens: SharedTokenProvider) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { http, tokens }
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let token = self.tokens.access_token().await?;
        let res = req.bearer_auth(token).send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(match status {
            reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(format!("{context}: {body}")),
            reqwest::StatusCode::FORBIDDEN => {
                ApiError::PermissionDenied(format!("{context}: {body}"))
            }
            reqwest::StatusCode::BAD_REQUEST => {
                ApiError::InvalidArgument(format!("{context}: {body}"))
            }
            _ => ApiError::Status {
                context: context.to_string(),
                status,
                body,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(
        res: reqwest::Response,
        url: &str,
    ) -> Result<T, ApiError> {
        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: format!("{e}; body={body}"),
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<T, ApiError> {
        let res = self.send(self.http.get(url).query(query), context).await?;
        Self::decode(res, url).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        context: &str,
    ) -> Result<T, ApiError> {
        let res = self.send(self.http.post(url).json(body), context).await?;
        Self::decode(res, url).await
    }

    pub(crate) async fn post_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &Value,
        context: &str,
    ) -> Result<T, ApiError> {
        let res = self
            .send(self.http.post(url).query(query).json(body), context)
            .await?;
        Self::decode(res, url).await
    }

    pub(crate) async fn patch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &Value,
        context: &str,
    ) -> Result<T, ApiError> {
        let res = self
            .send(self.http.patch(url).query(query).json(body), context)
            .await?;
        Self::decode(res, url).await
    }

    pub(crate) async fn delete(
        &self,
        url: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<(), ApiError> {
        self.send(self.http.delete(url).query(query), context).await?;
        Ok(())
    }
}
