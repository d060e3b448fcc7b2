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
    title: Selector,
    img: Selector,
    duration: Selector,
    views: Selector,
    rating: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("div.searchResults"),
    item: selector("div.video-box"),
    link: selector("a.video-box-image"),
    title: selector("div.video-box-title"),
    img: selector("img"),
    duration: selector("div.duration"),
    views: selector("div.video-box-views"),
    rating: selector("div.video-box-percentage"),
});

static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(YouPorn::BASE_URL).expect("base url"));

pub struct YouPorn {
    engine: Engine,
}

impl YouPorn {
    pub const BASE_URL: &str = "https://www.youporn.com";

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
            engine: Engine::new("youporn", "YouPorn", Self::BASE_URL, 2, capabilities, transport)?,
        })
    }
}

impl SearchEngine for YouPorn {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["yp", "youporn"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let mut url = format!(
            "{}/search/?query={}",
            Self::BASE_URL,
            urlencoding::encode(query)
        );
        if page > 1 {
            url.push_str(&format!("&page={page}"));
        }
        url
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let document = Html::parse_document(body);
        let s = &*SELECTORS;

        if document.select(&s.container).next().is_none() {
            return Err(EngineError::Parse("search results not found".to_string()));
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
                .select(&s.title)
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
