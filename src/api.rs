// API client module: a small blocking HTTP client for the keyscore API.
// One request per call; the caller decides what to do with the result.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    CountRequest, CreditsResponse, DetailedCountResponse, MachineInfo, MachineInfoResponse,
    SearchRequest, SearchResponse,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct ApiKeyBody<'a> {
    #[serde(rename = "apiKey")]
    api_key: &'a str,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("cliscore/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        ApiClient::new(&config.base_url)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Attaches `Authorization: Bearer <key>` when a key is given.
    fn authorized(builder: RequestBuilder, api_key: &str) -> RequestBuilder {
        if api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(api_key)
        }
    }

    fn post_json<B, T>(&self, endpoint: &str, body: &B, api_key: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);
        let res = Self::authorized(self.client.post(&url).json(body), api_key).send()?;
        let res = check_status(res)?;
        Ok(res.json()?)
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)], api_key: &str) -> Result<Response> {
        let url = self.url(endpoint);
        log::debug!("GET {} {:?}", url, query.iter().map(|(k, _)| k).collect::<Vec<_>>());
        let res = Self::authorized(self.client.get(&url).query(query), api_key).send()?;
        check_status(res)
    }

    pub fn search(&self, req: &SearchRequest, api_key: &str) -> Result<SearchResponse> {
        self.post_json("/search", req, api_key)
    }

    pub fn count(&self, req: &CountRequest, api_key: &str) -> Result<DetailedCountResponse> {
        self.post_json("/count/detailed", req, api_key)
    }

    /// Succeeds on `200 OK`; the endpoint returns no body in that case.
    pub fn validate_api_key(&self, api_key: &str) -> Result<()> {
        let url = self.url("/validate");
        log::debug!("POST {}", url);
        let res = Self::authorized(
            self.client.post(&url).json(&ApiKeyBody { api_key }),
            api_key,
        )
        .send()?;

        let status = res.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = res.text().unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => Err(Error::InvalidApiKey),
            StatusCode::BAD_REQUEST => Err(Error::BadRequest(body)),
            _ => Err(Error::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }

    pub fn machine_info(&self, uuid: &str, api_key: &str) -> Result<MachineInfo> {
        let res = self.get("/machineinfo", &[("uuid", uuid)], api_key)?;
        let parsed: MachineInfoResponse = res.json()?;
        if let Some(err) = parsed.error.filter(|e| !e.is_empty()) {
            return Err(Error::Api(err));
        }
        parsed
            .data
            .ok_or_else(|| Error::Api("response contained no machine information".into()))
    }

    /// Streams the archive (or a single file from it) to disk and returns
    /// the path written. The destination is only replaced once the whole
    /// body has arrived.
    pub fn download(
        &self,
        uuid: &str,
        file: Option<&str>,
        output: Option<&Path>,
        api_key: &str,
    ) -> Result<PathBuf> {
        let mut query = vec![("uuid", uuid)];
        if let Some(file) = file {
            query.push(("file", file));
        }
        let mut res = self.get("/download", &query, api_key)?;

        let path = download_destination(uuid, file, output);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Dropping the temp file on error removes it.
        let mut tmp = NamedTempFile::new_in(dir)?;
        let written = res.copy_to(tmp.as_file_mut())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        log::info!("wrote {} bytes to {}", written, path.display());
        Ok(path)
    }

    /// The credits endpoint takes the key in the body, not as a bearer token.
    pub fn credits(&self, api_key: &str) -> Result<CreditsResponse> {
        self.post_json("/credits", &ApiKeyBody { api_key }, "")
    }
}

fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_client_error() || status.is_server_error() {
        let body = res.text().unwrap_or_default();
        log::debug!("request failed with {}", status);
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(res)
}

/// Explicit output path, else the requested file's base name, else
/// `<uuid>.zip`.
pub fn download_destination(uuid: &str, file: Option<&str>, output: Option<&Path>) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }
    file.and_then(|f| Path::new(f).file_name())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}.zip", uuid)))
}
