use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::client::TransportConfig;
use crate::engine::{Engine, SearchEngine};
use crate::error::EngineError;
use crate::model::{ApiType, Capabilities, VideoResult};
use crate::parse::{
    THUMB_ATTRS, absolutize, attr_first, parse_duration_seconds, selector, text_of,
};

struct Selectors {
    container: Selector,
    item: Selector,
    link: Selector,
    img: Selector,
    caption: Selector,
    duration: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("div.content-inner"),
    item: selector("div.thumb-container"),
    link: selector("a.img-container"),
    img: selector("img.static"),
    caption: selector("a.title"),
    duration: selector("span.size"),
});

static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(Motherless::BASE_URL).expect("base url"));

/// Sparse tiles: a caption, a duration badge, and little else.
pub struct Motherless {
    engine: Engine,
}

impl Motherless {
    pub const BASE_URL: &str = "https://motherless.com";

    pub fn new(transport: &TransportConfig) -> Result<Self, EngineError> {
        let capabilities = Capabilities {
            has_duration: true,
            api_type: ApiType::Html,
            ..Default::default()
        };
        Ok(Self {
            engine: Engine::new(
                "motherless",
                "Motherless",
                Self::BASE_URL,
                4,
                capabilities,
                transport,
            )?,
        })
    }
}

impl SearchEngine for Motherless {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["ml", "motherless"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let encoded = urlencoding::encode(query).into_owned().replace("%20", "+");
        if page > 1 {
            format!(
                "{}/term/videos/{}?page={}",
                Self::BASE_URL,
                encoded,
                page
            )
        } else {
            format!("{}/term/videos/{}", Self::BASE_URL, encoded)
        }
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let document = Html::parse_document(body);
        let s = &*SELECTORS;

        if document.select(&s.container).next().is_none() {
            return Err(EngineError::Parse("content area not found".to_string()));
        }

        let mut results = Vec::new();
        for item in document.select(&s.item) {
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
            let title = item
                .select(&s.caption)
                .next()
                .map(text_of)
                .unwrap_or_default();
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

            if let Some(el) = item.select(&s.duration).next() {
                result.duration = text_of(el);
                result.duration_seconds = parse_duration_seconds(&result.duration).unwrap_or(0);
            }

            results.push(result);
        }

        Ok(results)
    }
}
