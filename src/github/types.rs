//! GitHub API types
//!
//! Wire types for the release and asset payloads this daemon consumes, plus
//! the `owner/repo` coordinate used to address a repository. GitHub returns
//! far more fields than we need; serde ignores the rest.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A repository coordinate in `owner/repo` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepoId {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("expected <owner>/<repo>, got '{}'", s)),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository metadata, fetched once at connect to validate the coordinate
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    /// GitHub's numeric repository identifier
    pub id: u64,
    /// Canonical `owner/repo` name
    pub full_name: String,
}

/// One release from `GET /repos/{owner}/{repo}/releases`
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    /// Numeric release identifier; doubles as the tag directory's inode
    pub id: u64,
    /// Tag name; doubles as the directory name
    pub tag_name: String,
    /// Display title, often absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub created_at: DateTime<Utc>,
    /// Unset while a release is still a draft
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// One asset from `GET /repos/{owner}/{repo}/releases/{id}/assets`
#[derive(Debug, Clone, Deserialize)]
pub struct AssetInfo {
    /// Numeric asset identifier; doubles as the file's inode
    pub id: u64,
    /// File name within the release directory
    pub name: String,
    /// Byte size as reported by GitHub
    pub size: u64,
    /// API download locator; serving it with an octet-stream Accept header
    /// redirects to the actual content
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_parses() {
        let id: RepoId = "rust-lang/rust".parse().unwrap();
        assert_eq!(id.owner, "rust-lang");
        assert_eq!(id.name, "rust");
        assert_eq!(id.to_string(), "rust-lang/rust");
    }

    #[test]
    fn test_repo_id_rejects_malformed() {
        assert!("norepo".parse::<RepoId>().is_err());
        assert!("/repo".parse::<RepoId>().is_err());
        assert!("owner/".parse::<RepoId>().is_err());
        assert!("a/b/c".parse::<RepoId>().is_err());
        assert!("".parse::<RepoId>().is_err());
    }

    #[test]
    fn test_deserialize_release() {
        let json = r#"{
            "id": 19887512,
            "tag_name": "v1.4.2",
            "name": "Release 1.4.2",
            "draft": false,
            "prerelease": false,
            "created_at": "2019-09-02T14:23:01Z",
            "published_at": "2019-09-03T09:00:00Z",
            "html_url": "https://github.com/o/r/releases/tag/v1.4.2",
            "assets": []
        }"#;
        let release: ReleaseInfo = serde_json::from_str(json).unwrap();
        assert_eq!(release.id, 19887512);
        assert_eq!(release.tag_name, "v1.4.2");
        assert_eq!(release.name.as_deref(), Some("Release 1.4.2"));
        assert!(!release.prerelease);
        assert!(release.published_at.is_some());
    }

    #[test]
    fn test_deserialize_draft_release_null_published_at() {
        // Drafts have no published_at and often a null name
        let json = r#"{
            "id": 7,
            "tag_name": "untagged-abc",
            "name": null,
            "draft": true,
            "prerelease": false,
            "created_at": "2020-01-01T00:00:00Z",
            "published_at": null
        }"#;
        let release: ReleaseInfo = serde_json::from_str(json).unwrap();
        assert!(release.draft);
        assert_eq!(release.name, None);
        assert_eq!(release.published_at, None);
    }

    #[test]
    fn test_deserialize_asset_extra_fields_ignored() {
        let json = r#"{
            "id": 13143150,
            "name": "tool-x86_64-linux.tar.gz",
            "label": "",
            "size": 5242880,
            "url": "https://api.github.com/repos/o/r/releases/assets/13143150",
            "browser_download_url": "https://github.com/o/r/releases/download/v1/tool.tar.gz",
            "content_type": "application/gzip",
            "state": "uploaded",
            "download_count": 942,
            "created_at": "2019-09-02T14:30:00Z",
            "updated_at": "2019-09-02T14:31:12Z"
        }"#;
        let asset: AssetInfo = serde_json::from_str(json).unwrap();
        assert_eq!(asset.id, 13143150);
        assert_eq!(asset.name, "tool-x86_64-linux.tar.gz");
        assert_eq!(asset.size, 5242880);
        assert_eq!(asset.content_type.as_deref(), Some("application/gzip"));
        assert!(asset.url.ends_with("/assets/13143150"));
    }

    #[test]
    fn test_deserialize_release_array() {
        let json = r#"[
            {"id": 1, "tag_name": "v2.0", "created_at": "2021-06-01T00:00:00Z"},
            {"id": 2, "tag_name": "v1.0", "created_at": "2021-01-01T00:00:00Z"}
        ]"#;
        let releases: Vec<ReleaseInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag_name, "v2.0");
        assert_eq!(releases[1].id, 2);
    }

    #[test]
    fn test_deserialize_repo_info() {
        let json = r#"{"id": 44838949, "full_name": "rust-lang/rust", "private": false}"#;
        let repo: RepoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(repo.id, 44838949);
        assert_eq!(repo.full_name, "rust-lang/rust");
    }
}
