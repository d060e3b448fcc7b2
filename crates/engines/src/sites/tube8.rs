use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::client::TransportConfig;
use crate::engine::{Engine, SearchEngine};
use crate::error::EngineError;
use crate::model::{ApiType, Capabilities, PreviewSource, VideoResult};
use crate::parse::{
    THUMB_ATTRS, absolutize, attr_first, find_preview, parse_duration_seconds, parse_views_count,
    selector, text_of,
};

struct Selectors {
    container: Selector,
    item: Selector,
    link: Selector,
    img: Selector,
    duration: Selector,
    views: Selector,
    premium: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("div#video_listing"),
    item: selector("li.search-video-thumb"),
    link: selector("a.video-title"),
    img: selector("img"),
    duration: selector("span.video-duration"),
    views: selector("span.video-views"),
    premium: selector("span.premium-video-flag"),
});

static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(Tube8::BASE_URL).expect("base url"));

pub struct Tube8 {
    engine: Engine,
}

impl Tube8 {
    pub const BASE_URL: &str = "https://www.tube8.com";

    pub fn new(transport: &TransportConfig) -> Result<Self, EngineError> {
        let capabilities = Capabilities {
            has_preview: true,
            has_duration: true,
            has_views: true,
            preview_source: PreviewSource::DataAttribute,
            api_type: ApiType::Html,
            ..Default::default()
        };
        Ok(Self {
            engine: Engine::new("tube8", "Tube8", Self::BASE_URL, 3, capabilities, transport)?,
        })
    }
}

impl SearchEngine for Tube8 {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["t8", "tube8"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let mut url = format!(
            "{}/searches.html?q={}",
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
            return Err(EngineError::Parse("video listing not found".to_string()));
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
            let title = text_of(link);
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

            results.push(result);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <div id="video_listing">
      <ul>
        <li class="search-video-thumb">
          <img data-thumb="https://ci.t8cdn.com/t.jpg" data-mediabook="https://cv.t8cdn.com/m.webm">
          <a class="video-title" href="/porn-video/9001/">T8 clip</a>
          <span class="video-duration">9:58</span>
          <span class="video-views">88K views</span>
        </li>
      </ul>
    </div>"#;

    fn engine() -> Tube8 {
        Tube8::new(&TransportConfig::default()).expect("engine")
    }

    #[test]
    fn parses_search_thumbs() {
        let results = engine().parse_page(FIXTURE).unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.url, "https://www.tube8.com/porn-video/9001/");
        assert_eq!(r.thumbnail, "https://ci.t8cdn.com/t.jpg");
        assert_eq!(r.duration_seconds, 598);
        assert_eq!(r.views_count, 88_000);
    }
}
