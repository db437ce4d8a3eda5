//! Snapshot a GitHub repository through the REST contents API.

use std::collections::HashSet;
use std::fmt;

use base64::Engine;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use reposift_llm::http::default_client;
use reposift_llm::retry::send_with_retry;

use crate::content::{DEFAULT_EXCLUDED_PATTERNS, clean_content, is_excluded};
use crate::error::{FetchError, RepoError};
use crate::snapshot::{FileEntry, Snapshot, Submodule};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";
const API_VERSION: &str = "2022-11-28";

/// `owner/repo` pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parse `owner/repo`, or any GitHub URL form accepted by [`RepoId::from_url`].
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidRepo` when the input names no repository.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let trimmed = input.trim().trim_end_matches('/');
        if trimmed.contains("github.com") {
            return Self::from_url(trimmed).ok_or_else(|| FetchError::InvalidRepo(input.into()));
        }
        match trimmed.split_once('/') {
            Some((owner, name)) if valid_segment(owner) && valid_segment(name) => Ok(Self {
                owner: owner.into(),
                name: name.trim_end_matches(".git").into(),
            }),
            _ => Err(FetchError::InvalidRepo(input.into())),
        }
    }

    /// Extract the repository from a github.com URL: `https://`, `git://`,
    /// `ssh://git@` or scp-style `git@github.com:owner/repo.git`, with or
    /// without a trailing `/tree/<ref>`. Returns `None` for other hosts.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let (_, rest) = url.split_once("github.com")?;
        let mut parts = rest
            .trim_start_matches([':', '/'])
            .split('/')
            .filter(|s| !s.is_empty());
        let owner = parts.next()?;
        let name = parts.next()?.trim_end_matches(".git");
        (valid_segment(owner) && valid_segment(name)).then(|| Self {
            owner: owner.into(),
            name: name.into(),
        })
    }

    fn key(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn valid_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains(['/', ' ', ':']) && s != "." && s != ".."
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    submodule_git_url: Option<String>,
}

impl ContentItem {
    fn is_submodule(&self) -> bool {
        self.kind == "submodule" || self.submodule_git_url.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct FileBody {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Default)]
struct Tree {
    files: Vec<FileEntry>,
    submodules: Vec<Submodule>,
}

/// Fetches repository snapshots from GitHub.
///
/// Every failure below the root listing (one file, one directory, one
/// submodule) is logged at `warn` and skipped.
#[derive(Clone)]
pub struct GithubFetcher {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    default_branch: String,
    exclude: Vec<String>,
    max_retries: u32,
}

impl fmt::Debug for GithubFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubFetcher")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("default_branch", &self.default_branch)
            .field("exclude", &self.exclude.len())
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl GithubFetcher {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: default_client(),
            api_url: DEFAULT_API_URL.into(),
            token,
            default_branch: DEFAULT_BRANCH.into(),
            exclude: DEFAULT_EXCLUDED_PATTERNS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            max_retries: 3,
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Branch used when the repository metadata cannot be read.
    #[must_use]
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    #[must_use]
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Capture `repo` (`owner/repo` or a GitHub URL) at its default branch,
    /// submodules included.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo` is not a repository identifier or the root
    /// directory listing fails. Anything deeper is skipped with a warning.
    pub async fn fetch(&self, repo: &str) -> Result<Snapshot, RepoError> {
        let id = RepoId::parse(repo)?;
        tracing::info!(repo = %id, "fetching repository");

        let mut ancestors = HashSet::new();
        let tree = self.fetch_tree(&id, None, "", &mut ancestors).await?;

        let mut snapshot = Snapshot {
            repo_name: id.to_string(),
            files: tree.files,
            submodules: tree.submodules,
        };
        snapshot.sort();
        tracing::info!(
            repo = %id,
            files = snapshot.files.len(),
            submodules = snapshot.submodules.len(),
            "repository fetched"
        );
        Ok(snapshot)
    }

    /// `ancestors` holds the repositories on the current submodule path.
    async fn fetch_tree(
        &self,
        id: &RepoId,
        git_ref: Option<&str>,
        mount: &str,
        ancestors: &mut HashSet<String>,
    ) -> Result<Tree, FetchError> {
        let key = id.key();
        if !ancestors.insert(key.clone()) {
            return Err(FetchError::Cycle(key));
        }

        let git_ref = match git_ref {
            Some(r) => r.to_owned(),
            None => self.default_branch_of(id).await,
        };
        let result = self.walk(id, &git_ref, mount, ancestors).await;

        ancestors.remove(&key);
        result
    }

    async fn walk(
        &self,
        id: &RepoId,
        git_ref: &str,
        mount: &str,
        ancestors: &mut HashSet<String>,
    ) -> Result<Tree, FetchError> {
        let mut tree = Tree::default();
        let mut pending = vec![self.list(id, "", git_ref).await?];

        while let Some(items) = pending.pop() {
            for item in items {
                let full_path = mounted(mount, &item.path);
                if is_excluded(&full_path, &self.exclude) {
                    tracing::debug!(path = %full_path, "excluded");
                    continue;
                }

                if item.is_submodule() {
                    match self
                        .fetch_submodule(&item, &full_path, ancestors)
                        .await
                    {
                        Ok(sub) => tree.submodules.push(sub),
                        Err(e) => tracing::warn!(path = %full_path, "submodule skipped: {e}"),
                    }
                    continue;
                }

                match item.kind.as_str() {
                    "file" => match self.file(id, &item.path, git_ref).await {
                        Ok(content) => tree.files.push(FileEntry::new(full_path, content)),
                        Err(e) => tracing::warn!(path = %full_path, "file skipped: {e}"),
                    },
                    "dir" => match self.list(id, &item.path, git_ref).await {
                        Ok(children) => pending.push(children),
                        Err(e) => tracing::warn!(path = %full_path, "directory skipped: {e}"),
                    },
                    other => tracing::debug!(path = %full_path, kind = other, "ignored item"),
                }
            }
        }

        Ok(tree)
    }

    async fn fetch_submodule(
        &self,
        item: &ContentItem,
        mount: &str,
        ancestors: &mut HashSet<String>,
    ) -> Result<Submodule, FetchError> {
        let git_url = item
            .submodule_git_url
            .as_deref()
            .or(item.html_url.as_deref())
            .ok_or_else(|| FetchError::UnsupportedSubmodule(item.path.clone()))?;
        let sub_id = RepoId::from_url(git_url)
            .ok_or_else(|| FetchError::UnsupportedSubmodule(git_url.to_owned()))?;

        let commit = match &item.sha {
            Some(sha) => sha.clone(),
            None => self.default_branch_of(&sub_id).await,
        };
        tracing::debug!(path = mount, repo = %sub_id, commit = %commit, "fetching submodule");

        let tree = Box::pin(self.fetch_tree(&sub_id, Some(&commit), mount, ancestors)).await?;

        Ok(Submodule {
            name: mount.to_owned(),
            url: format!("https://github.com/{sub_id}"),
            commit,
            files: tree.files,
            submodules: tree.submodules,
        })
    }

    async fn default_branch_of(&self, id: &RepoId) -> String {
        let url = match self.url(&["repos", &id.owner, &id.name]) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(repo = %id, "{e}");
                return self.default_branch.clone();
            }
        };
        match self.get_json::<RepoInfo>(url).await {
            Ok(RepoInfo {
                default_branch: Some(branch),
            }) => branch,
            Ok(_) => self.default_branch.clone(),
            Err(e) => {
                tracing::warn!(
                    repo = %id,
                    fallback = %self.default_branch,
                    "default branch lookup failed: {e}"
                );
                self.default_branch.clone()
            }
        }
    }

    async fn list(
        &self,
        id: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<ContentItem>, FetchError> {
        let url = self.contents_url(id, path, git_ref)?;
        let shown = url.to_string();
        let value: serde_json::Value = self.get_json(url).await?;
        if !value.is_array() {
            return Err(FetchError::UnexpectedShape(shown));
        }
        serde_json::from_value(value).map_err(|_| FetchError::UnexpectedShape(shown))
    }

    async fn file(&self, id: &RepoId, path: &str, git_ref: &str) -> Result<String, FetchError> {
        let url = self.contents_url(id, path, git_ref)?;
        let body: FileBody = self.get_json(url).await?;

        match (body.encoding.as_deref(), body.content) {
            (Some("base64"), Some(encoded)) => {
                let compact: String = encoded.split_ascii_whitespace().collect();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|source| FetchError::Decode {
                        path: path.to_owned(),
                        source,
                    })?;
                clean_content(path, &bytes)
            }
            (encoding, _) => Err(FetchError::UnexpectedShape(format!(
                "{path} (encoding {})",
                encoding.unwrap_or("missing")
            ))),
        }
    }

    fn contents_url(
        &self,
        id: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> Result<reqwest::Url, FetchError> {
        let mut segments = vec!["repos", id.owner.as_str(), id.name.as_str(), "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.url(&segments)?;
        url.query_pairs_mut().append_pair("ref", git_ref);
        Ok(url)
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, FetchError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<T, FetchError> {
        let response = send_with_retry("github", self.max_retries, || {
            let mut request = self
                .client
                .get(url.clone())
                .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                .header("X-GitHub-Api-Version", API_VERSION);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            request.send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

fn mounted(mount: &str, path: &str) -> String {
    if mount.is_empty() {
        path.to_owned()
    } else {
        format!("{mount}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn encoded(text: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(text)
    }

    fn fetcher(server: &MockServer) -> GithubFetcher {
        GithubFetcher::new(Some("t0k".into()))
            .with_api_url(server.uri())
            .with_max_retries(0)
    }

    async fn mount_repo(server: &MockServer, repo: &str, branch: Option<&str>) {
        let body = match branch {
            Some(b) => json!({ "default_branch": b }),
            None => json!({}),
        };
        Mock::given(method("GET"))
            .and(path(format!("/repos/{repo}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_listing(server: &MockServer, repo: &str, dir: &str, git_ref: &str, items: serde_json::Value) {
        let p = if dir.is_empty() {
            format!("/repos/{repo}/contents")
        } else {
            format!("/repos/{repo}/contents/{dir}")
        };
        Mock::given(method("GET"))
            .and(path(p))
            .and(query_param("ref", git_ref))
            .respond_with(ResponseTemplate::new(200).set_body_json(items))
            .mount(server)
            .await;
    }

    async fn mount_file(server: &MockServer, repo: &str, file: &str, git_ref: &str, bytes: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{repo}/contents/{file}")))
            .and(query_param("ref", git_ref))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "path": file,
                "encoding": "base64",
                "content": encoded(bytes),
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn parses_repo_identifiers() {
        let id = RepoId::parse("acme/app").unwrap();
        assert_eq!(id.to_string(), "acme/app");
        assert_eq!(RepoId::parse("https://github.com/acme/app/").unwrap(), id);
        assert_eq!(RepoId::parse("acme/app.git").unwrap(), id);
        assert!(RepoId::parse("acme").is_err());
        assert!(RepoId::parse("acme/app/extra").is_err());
        assert!(RepoId::parse("").is_err());
    }

    #[test]
    fn parses_submodule_urls() {
        let want = RepoId {
            owner: "acme".into(),
            name: "lib".into(),
        };
        for url in [
            "https://github.com/acme/lib.git",
            "git://github.com/acme/lib.git",
            "git@github.com:acme/lib.git",
            "ssh://git@github.com/acme/lib",
            "https://github.com/acme/lib/tree/abc123",
        ] {
            assert_eq!(RepoId::from_url(url).as_ref(), Some(&want), "{url}");
        }
        assert!(RepoId::from_url("https://gitlab.com/acme/lib.git").is_none());
        assert!(RepoId::from_url("../lib.git").is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let f = GithubFetcher::new(Some("ghp_secret".into()));
        let out = format!("{f:?}");
        assert!(!out.contains("ghp_secret"));
        assert!(out.contains("<redacted>"));
    }

    #[tokio::test]
    async fn fetches_files_and_directories_at_default_branch() {
        let server = MockServer::start().await;
        mount_repo(&server, "acme/app", Some("dev")).await;
        mount_listing(
            &server,
            "acme/app",
            "",
            "dev",
            json!([
                { "type": "file", "path": "main.py" },
                { "type": "file", "path": ".DS_Store" },
                { "type": "file", "path": "logo.png" },
                { "type": "dir", "path": "src" },
            ]),
        )
        .await;
        mount_listing(
            &server,
            "acme/app",
            "src",
            "dev",
            json!([{ "type": "file", "path": "src/util.cpp" }]),
        )
        .await;
        mount_file(&server, "acme/app", "main.py", "dev", b"print('hi')\n").await;
        mount_file(&server, "acme/app", "logo.png", "dev", b"\x89PNG\0\0\0").await;
        mount_file(&server, "acme/app", "src/util.cpp", "dev", b"int x;   \nint y;\n").await;

        let snap = fetcher(&server).fetch("acme/app").await.unwrap();

        assert_eq!(snap.repo_name, "acme/app");
        let paths: Vec<_> = snap.files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, ["main.py", "src/util.cpp"]);
        assert_eq!(snap.files[0].content, "print('hi')\n");
        assert_eq!(snap.files[1].content, "int x;\nint y;\n");
        assert!(snap.submodules.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_configured_branch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/app"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_listing(
            &server,
            "acme/app",
            "",
            "trunk",
            json!([{ "type": "file", "path": "a.txt" }]),
        )
        .await;
        mount_file(&server, "acme/app", "a.txt", "trunk", b"alpha").await;

        let snap = fetcher(&server)
            .with_default_branch("trunk")
            .fetch("acme/app")
            .await
            .unwrap();
        assert_eq!(snap.files.len(), 1);
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        mount_repo(&server, "acme/app", Some("main")).await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let snap = fetcher(&server).fetch("acme/app").await.unwrap();
        assert!(snap.files.is_empty());
    }

    #[tokio::test]
    async fn failing_file_is_skipped() {
        let server = MockServer::start().await;
        mount_repo(&server, "acme/app", Some("main")).await;
        mount_listing(
            &server,
            "acme/app",
            "",
            "main",
            json!([
                { "type": "file", "path": "ok.txt" },
                { "type": "file", "path": "gone.txt" },
                { "type": "dir", "path": "broken" },
            ]),
        )
        .await;
        mount_file(&server, "acme/app", "ok.txt", "main", b"fine").await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents/gone.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let snap = fetcher(&server).fetch("acme/app").await.unwrap();
        let paths: Vec<_> = snap.files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, ["ok.txt"]);
    }

    #[tokio::test]
    async fn root_listing_failure_is_an_error() {
        let server = MockServer::start().await;
        mount_repo(&server, "acme/app", Some("main")).await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch("acme/app").await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Fetch(FetchError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn fetches_submodule_at_pinned_commit() {
        let server = MockServer::start().await;
        mount_repo(&server, "acme/app", Some("main")).await;
        mount_listing(
            &server,
            "acme/app",
            "",
            "main",
            json!([
                { "type": "file", "path": "app.py" },
                {
                    "type": "submodule",
                    "path": "vendor/lib",
                    "sha": "abc123",
                    "submodule_git_url": "https://github.com/acme/lib.git",
                },
            ]),
        )
        .await;
        mount_file(&server, "acme/app", "app.py", "main", b"import lib").await;
        mount_listing(
            &server,
            "acme/lib",
            "",
            "abc123",
            json!([{ "type": "file", "path": "lib.py" }]),
        )
        .await;
        mount_file(&server, "acme/lib", "lib.py", "abc123", b"def f(): pass").await;

        let snap = fetcher(&server).fetch("acme/app").await.unwrap();

        assert_eq!(snap.files.len(), 1);
        assert_eq!(snap.submodules.len(), 1);
        let sub = &snap.submodules[0];
        assert_eq!(sub.name, "vendor/lib");
        assert_eq!(sub.commit, "abc123");
        assert_eq!(sub.url, "https://github.com/acme/lib");
        assert_eq!(sub.files[0].file_path, "vendor/lib/lib.py");
        assert_eq!(sub.files[0].content, "def f(): pass");
    }

    #[tokio::test]
    async fn submodule_cycle_is_skipped() {
        let server = MockServer::start().await;
        mount_repo(&server, "acme/app", Some("main")).await;
        mount_listing(
            &server,
            "acme/app",
            "",
            "main",
            json!([
                { "type": "file", "path": "a.txt" },
                {
                    "type": "submodule",
                    "path": "self",
                    "sha": "main",
                    "submodule_git_url": "git@github.com:Acme/App.git",
                },
            ]),
        )
        .await;
        mount_file(&server, "acme/app", "a.txt", "main", b"alpha").await;

        let snap = fetcher(&server).fetch("acme/app").await.unwrap();
        assert_eq!(snap.files.len(), 1);
        assert!(snap.submodules.is_empty());
    }
}
