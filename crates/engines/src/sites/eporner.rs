use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::client::TransportConfig;
use crate::engine::{Engine, SearchEngine};
use crate::error::EngineError;
use crate::model::{ApiType, Capabilities, PreviewSource, VideoResult};

/// The one upstream with a real JSON search API; no scraping involved.
pub struct Eporner {
    engine: Engine,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    videos: Vec<ApiVideo>,
}

#[derive(Debug, Deserialize)]
struct ApiVideo {
    title: String,
    url: String,
    #[serde(default)]
    keywords: String,
    #[serde(default)]
    views: u64,
    /// Rating on a 0-5 scale, serialized as a string like "4.53".
    #[serde(default)]
    rate: String,
    #[serde(default)]
    added: String,
    #[serde(default)]
    length_sec: u32,
    #[serde(default)]
    length_min: String,
    default_thumb: Option<ApiThumb>,
}

#[derive(Debug, Deserialize)]
struct ApiThumb {
    src: String,
}

impl Eporner {
    pub const BASE_URL: &str = "https://www.eporner.com";
    const PER_PAGE: u32 = 30;

    pub fn new(transport: &TransportConfig) -> Result<Self, EngineError> {
        let capabilities = Capabilities {
            has_duration: true,
            has_views: true,
            has_rating: true,
            has_upload_date: true,
            preview_source: PreviewSource::Api,
            api_type: ApiType::Json,
            ..Default::default()
        };
        Ok(Self {
            engine: Engine::new("eporner", "Eporner", Self::BASE_URL, 3, capabilities, transport)?,
        })
    }
}

impl SearchEngine for Eporner {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["ep", "eporner"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        format!(
            "{}/api/v2/video/search/?query={}&page={}&per_page={}&thumbsize=medium&format=json",
            Self::BASE_URL,
            urlencoding::encode(query),
            page.max(1),
            Self::PER_PAGE,
        )
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let response: ApiResponse = serde_json::from_str(body)
            .map_err(|e| EngineError::Parse(format!("API response: {e}")))?;

        let results = response
            .videos
            .into_iter()
            .filter(|video| video.url.starts_with("http"))
            .map(|video| {
                let mut result = VideoResult::new(
                    self.engine.name,
                    self.engine.display_name,
                    video.url,
                    video.title,
                );
                if let Some(thumb) = video.default_thumb {
                    result.thumbnail = thumb.src;
                }
                result.duration_seconds = video.length_sec;
                result.duration = if video.length_min.is_empty() {
                    format!("{}:{:02}", video.length_sec / 60, video.length_sec % 60)
                } else {
                    video.length_min
                };
                result.views_count = video.views;
                result.views = video.views.to_string();
                // 0-5 star scale → percentage.
                if let Ok(rate) = video.rate.parse::<f64>() {
                    result.rating = Some(((rate / 5.0) * 100.0).round().clamp(0.0, 100.0) as u8);
                }
                if let Ok(added) = NaiveDateTime::parse_from_str(&video.added, "%Y-%m-%d %H:%M:%S")
                {
                    result.published = Some(added.and_utc());
                }
                result.tags = video
                    .keywords
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
                result
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
      "count": 1,
      "page": 1,
      "videos": [
        {
          "id": 3100001,
          "title": "EP clip",
          "keywords": "amateur, pov, hd",
          "views": 123456,
          "rate": "4.50",
          "url": "https://www.eporner.com/video-abc/ep-clip/",
          "added": "2024-11-02 08:30:00",
          "length_sec": 1501,
          "length_min": "25:01",
          "default_thumb": {"size": "medium", "src": "https://static-eu-cdn.eporner.com/t.jpg"}
        }
      ]
    }"#;

    fn engine() -> Eporner {
        Eporner::new(&TransportConfig::default()).expect("engine")
    }

    #[test]
    fn parses_api_response() {
        let results = engine().parse_page(FIXTURE).unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.url, "https://www.eporner.com/video-abc/ep-clip/");
        assert_eq!(r.duration, "25:01");
        assert_eq!(r.duration_seconds, 1501);
        assert_eq!(r.views_count, 123_456);
        assert_eq!(r.rating, Some(90));
        assert_eq!(r.tags, vec!["amateur", "pov", "hd"]);
        assert!(r.published.is_some());
        assert_eq!(r.thumbnail, "https://static-eu-cdn.eporner.com/t.jpg");
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(
            engine().parse_page("<html>not json</html>"),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn search_url_includes_paging() {
        let url = engine().search_url("solo", 2);
        assert!(url.contains("query=solo"));
        assert!(url.contains("page=2"));
        assert!(url.contains("format=json"));
    }
}
