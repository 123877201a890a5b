//! `ReviewSource` driver for the WordPress REST API.

use crate::error::SourceError;
use crate::traits::ReviewSource;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use domain::{ImageOrigin, ReviewImage, SourcePage, SourceRecord};
use serde::Deserialize;
use serde_json::Value;

pub struct WordPressSource {
    client: reqwest::Client,
    base_url: String,
    /// Application password credentials; without them WordPress hides
    /// author email/IP and refuses comment deletion.
    auth: Option<(String, String)>,
}

#[derive(Deserialize)]
struct WpComment {
    id: i64,
    post: i64,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    author_email: String,
    #[serde(default)]
    author_ip: String,
    content: WpRendered,
    date: String,
    #[serde(default)]
    meta: Value,
}

#[derive(Deserialize)]
struct WpPost {
    id: i64,
    title: WpRendered,
}

#[derive(Deserialize)]
struct WpRendered {
    #[serde(default)]
    rendered: String,
}

impl WordPressSource {
    pub fn new(base_url: &str, auth: Option<(String, String)>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}/wp-json/wp/v2{}", self.base_url, path));
        match &self.auth {
            Some((user, password)) => req.basic_auth(user, Some(password)),
            None => req,
        }
    }

    fn parse_date(raw: &str) -> Result<NaiveDateTime, SourceError> {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .map_err(|e| SourceError::Protocol(format!("bad date '{}': {}", raw, e)))
    }

    fn to_source_record(c: WpComment) -> Result<SourceRecord, SourceError> {
        // 评分插件把 rating 塞在 meta 里,不是所有站点都有
        let rating = c
            .meta
            .get("rating")
            .and_then(Value::as_i64)
            .map(|r| r as i32);
        let images = c
            .meta
            .get("attachment_urls")
            .and_then(Value::as_array)
            .map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(|url| ReviewImage {
                        url: url.to_string(),
                        origin: ImageOrigin::Attachment,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(SourceRecord {
            external_id: c.id,
            page_id: c.post,
            author_name: c.author_name,
            author_email: c.author_email,
            author_ip: c.author_ip,
            body: c.content.rendered,
            submitted_at: Self::parse_date(&c.date)?,
            rating,
            images,
        })
    }
}

#[async_trait]
impl ReviewSource for WordPressSource {
    async fn count_approved(&self) -> Result<u64, SourceError> {
        let response = self
            .request(reqwest::Method::GET, "/comments")
            .query(&[("status", "approve"), ("per_page", "1")])
            .send()
            .await?
            .error_for_status()?;

        response
            .headers()
            .get("X-WP-Total")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| SourceError::Protocol("missing X-WP-Total header".into()))
    }

    async fn fetch_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SourceRecord>, SourceError> {
        let comments: Vec<WpComment> = self
            .request(reqwest::Method::GET, "/comments")
            .query(&[
                ("status", "approve".to_string()),
                ("offset", offset.to_string()),
                ("per_page", limit.to_string()),
                ("orderby", "id".to_string()),
                ("order", "asc".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        comments.into_iter().map(Self::to_source_record).collect()
    }

    async fn get_page(&self, page_id: i64) -> Result<Option<SourcePage>, SourceError> {
        // Reviews kunnen op posts én op pagina's staan
        for endpoint in ["posts", "pages"] {
            let response = self
                .request(reqwest::Method::GET, &format!("/{}/{}", endpoint, page_id))
                .send()
                .await?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                continue;
            }
            let post: WpPost = response.error_for_status()?.json().await?;
            return Ok(Some(SourcePage {
                page_id: post.id,
                title: post.title.rendered,
            }));
        }
        Ok(None)
    }

    async fn delete_record(&self, external_id: i64) -> Result<(), SourceError> {
        self.request(
            reqwest::Method::DELETE,
            &format!("/comments/{}", external_id),
        )
        .query(&[("force", "true")])
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }
}
