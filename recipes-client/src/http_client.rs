use reqwest::header::CONTENT_RANGE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::models::ErrorResponseDto;

const PREFER: &str = "Prefer";

/// Параметры подключения к серверу.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Базовый URL, например `https://project.example.co`.
    pub base_url: String,
    /// Публичный ключ, отправляется в заголовке `apikey`.
    pub api_key: String,
    /// Таймаут установки соединения.
    pub connect_timeout: Duration,
    /// Таймаут всего запроса.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Конфигурация с таймаутами по умолчанию (5 и 15 секунд).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-клиент для REST и auth API сервера.
pub(crate) struct HttpClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpClient {
    pub(crate) fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Запрос с ключом проекта; без токена пользователя авторизуется ключом.
    pub(crate) fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        debug!(%method, path, authenticated = token.is_some(), "http request");
        self.client
            .request(method, self.endpoint(path))
            .header("apikey", &self.api_key)
            .bearer_auth(token.unwrap_or(&self.api_key))
    }

    async fn decode_error(response: Response) -> ClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body
                .into_message()
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        ClientError::from_http_status(status, Some(message))
    }

    async fn send(request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await.map_err(ClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response)
    }

    /// Отправляет запрос и разбирает JSON-ответ.
    pub(crate) async fn fetch<TRes>(request: RequestBuilder) -> ClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        Self::send(request)
            .await?
            .json::<TRes>()
            .await
            .map_err(ClientError::from_reqwest)
    }

    /// Отправляет запрос, тело ответа не читается.
    pub(crate) async fn execute(request: RequestBuilder) -> ClientResult<()> {
        Self::send(request).await.map(|_| ())
    }

    /// Запись в таблицу с возвратом изменённых строк.
    pub(crate) async fn write_rows<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&TReq>,
        token: &str,
    ) -> ClientResult<Vec<TRes>>
    where
        TReq: Serialize,
        TRes: DeserializeOwned,
    {
        let mut request = self
            .request(method, path, Some(token))
            .query(query)
            .header(PREFER, "return=representation");
        if let Some(body) = body {
            request = request.json(body);
        }
        Self::fetch(request).await
    }

    /// Точное число строк по фильтру из заголовка `Content-Range`.
    pub(crate) async fn count_rows(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> ClientResult<u64> {
        let request = self
            .request(Method::GET, path, token)
            .query(query)
            .header(PREFER, "count=exact");
        let response = Self::send(request).await?;

        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ClientError::Decode("missing Content-Range header".to_string()))?;
        parse_total(header)
            .ok_or_else(|| ClientError::Decode(format!("invalid Content-Range: {header}")))
    }
}

/// Разбирает общее число строк из `0-2/3` или `*/0`.
fn parse_total(content_range: &str) -> Option<u64> {
    let (_, total) = content_range.trim().split_once('/')?;
    total.parse().ok()
}
