use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::client::TransportConfig;
use crate::engine::{Engine, SearchEngine};
use crate::error::EngineError;
use crate::model::{ApiType, Capabilities, PreviewSource, VideoResult};
use crate::parse::{
    THUMB_ATTRS, absolutize, attr_first, find_preview, parse_duration_seconds,
    parse_rating_percent, parse_views_count, selector, text_of,
};

struct Selectors {
    container: Selector,
    item: Selector,
    link: Selector,
    img: Selector,
    duration: Selector,
    views: Selector,
    rating: Selector,
    premium: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("ul#block_list_videos"),
    item: selector("li.videoblock"),
    link: selector("a.video_link"),
    img: selector("img.js_thumbImageTag"),
    duration: selector("span.duration"),
    views: selector("span.video_count"),
    rating: selector("span.video_rating"),
    premium: selector("span.premium_icon"),
});

static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(Redtube::BASE_URL).expect("base url"));

pub struct Redtube {
    engine: Engine,
}

impl Redtube {
    pub const BASE_URL: &str = "https://www.redtube.com";

    pub fn new(transport: &TransportConfig) -> Result<Self, EngineError> {
        let capabilities = Capabilities {
            has_preview: true,
            has_duration: true,
            has_views: true,
            has_rating: true,
            preview_source: PreviewSource::DataAttribute,
            api_type: ApiType::Html,
            ..Default::default()
        };
        Ok(Self {
            engine: Engine::new("redtube", "RedTube", Self::BASE_URL, 1, capabilities, transport)?,
        })
    }
}

impl SearchEngine for Redtube {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["rt", "redtube"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let mut url = format!("{}/?search={}", Self::BASE_URL, urlencoding::encode(query));
        if page > 1 {
            url.push_str(&format!("&page={page}"));
        }
        url
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let document = Html::parse_document(body);
        let s = &*SELECTORS;

        if document.select(&s.container).next().is_none() {
            return Err(EngineError::Parse("video list not found".to_string()));
        }

        let mut results = Vec::new();
        for item in document.select(&s.item) {
            if item.select(&s.premium).next().is_some() {
                continue;
            }
            let Some(link) = item.select(&s.link).next() else {
                continue;
            };
            let Some(url) = link
                .value()
                .attr("href")
                .and_then(|href| absolutize(&BASE, href))
            else {
                continue;
            };
            let title = link
                .value()
                .attr("title")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| text_of(link));
            if title.is_empty() {
                continue;
            }

            let mut result =
                VideoResult::new(self.engine.name, self.engine.display_name, url, title);

            if let Some(img) = item.select(&s.img).next()
                && let Some(thumb) = attr_first(img, THUMB_ATTRS)
                && let Some(abs) = absolutize(&BASE, thumb)
            {
                result.thumbnail = abs;
            }
            result.preview_url = find_preview(item);

            if let Some(el) = item.select(&s.duration).next() {
                result.duration = text_of(el);
                result.duration_seconds = parse_duration_seconds(&result.duration).unwrap_or(0);
            }
            if let Some(el) = item.select(&s.views).next() {
                result.views = text_of(el);
                result.views_count = parse_views_count(&result.views).unwrap_or(0);
            }
            if let Some(el) = item.select(&s.rating).next() {
                result.rating = parse_rating_percent(&text_of(el));
            }

            results.push(result);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <ul id="block_list_videos">
      <li class="videoblock">
        <a class="video_link" href="/40001" title="Clip one">
          <img class="js_thumbImageTag" data-src="https://wi-ph.rdtcdn.com/a.jpg"
               data-mediabook="https://ei-ph.rdtcdn.com/a.webm">
        </a>
        <span class="duration">25:01</span>
        <span class="video_count">764K</span>
        <span class="video_rating">91%</span>
      </li>
    </ul>"#;

    fn engine() -> Redtube {
        Redtube::new(&TransportConfig::default()).expect("engine")
    }

    #[test]
    fn parses_video_blocks() {
        let results = engine().parse_page(FIXTURE).unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.url, "https://www.redtube.com/40001");
        assert_eq!(r.title, "Clip one");
        assert_eq!(r.duration_seconds, 1501);
        assert_eq!(r.views_count, 764_000);
        assert_eq!(r.rating, Some(91));
        assert_eq!(r.preview_url.as_deref(), Some("https://ei-ph.rdtcdn.com/a.webm"));
    }

    #[test]
    fn missing_listing_is_parse_error() {
        assert!(matches!(
            engine().parse_page("<div></div>"),
            Err(EngineError::Parse(_))
        ));
    }
}
