use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::client::TransportConfig;
use crate::engine::{Engine, SearchEngine};
use crate::error::EngineError;
use crate::model::{ApiType, Capabilities, PreviewSource, VideoResult};
use crate::parse::{
    THUMB_ATTRS, absolutize, attr_first, find_preview, parse_duration_seconds, parse_quality,
    parse_views_count, selector, text_of,
};

struct Selectors {
    container: Selector,
    item: Selector,
    title_link: Selector,
    img: Selector,
    metadata: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("div.mozaique"),
    item: selector("div.thumb-block"),
    title_link: selector("div.thumb-under p a"),
    img: selector("div.thumb img"),
    metadata: selector("div.thumb-under p.metadata"),
});

static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(Xnxx::BASE_URL).expect("base url"));

/// Same tile family as xvideos, but the metadata line packs views, quality
/// and an `Nmin` duration into one string.
pub struct Xnxx {
    engine: Engine,
}

impl Xnxx {
    pub const BASE_URL: &str = "https://www.xnxx.com";

    pub fn new(transport: &TransportConfig) -> Result<Self, EngineError> {
        let capabilities = Capabilities {
            has_preview: true,
            has_duration: true,
            has_views: true,
            has_quality: true,
            preview_source: PreviewSource::DataAttribute,
            api_type: ApiType::Html,
            ..Default::default()
        };
        Ok(Self {
            engine: Engine::new("xnxx", "XNXX", Self::BASE_URL, 1, capabilities, transport)?,
        })
    }
}

impl SearchEngine for Xnxx {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["xn", "xnxx"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        // Path-style search; page 1 has no trailing index.
        let encoded = urlencoding::encode(query).into_owned().replace("%20", "+");
        if page > 1 {
            format!("{}/search/{}/{}", Self::BASE_URL, encoded, page - 1)
        } else {
            format!("{}/search/{}", Self::BASE_URL, encoded)
        }
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let document = Html::parse_document(body);
        let s = &*SELECTORS;

        if document.select(&s.container).next().is_none() {
            return Err(EngineError::Parse("result mosaic not found".to_string()));
        }

        let mut results = Vec::new();
        for item in document.select(&s.item) {
            let Some(link) = item.select(&s.title_link).next() else {
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

            // "98.7k 720p 7min": views, optional quality badge, duration.
            if let Some(el) = item.select(&s.metadata).next() {
                let meta = text_of(el);
                result.quality = parse_quality(&meta);
                if let Some(seconds) = parse_duration_seconds(&meta) {
                    result.duration_seconds = seconds;
                    result.duration = format!("{} min", seconds / 60);
                }
                if let Some(first) = meta.split_whitespace().next()
                    && let Some(count) = parse_views_count(first)
                {
                    result.views = first.to_string();
                    result.views_count = count;
                }
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
    <div class="mozaique cust-nb-cols">
      <div class="thumb-block">
        <div class="thumb">
          <a href="/video-abc123/clip"><img data-src="https://img.xnxx-cdn.com/t.jpg"></a>
        </div>
        <div class="thumb-under">
          <p><a href="/video-abc123/clip" title="A clip">A clip</a></p>
          <p class="metadata">98.7K 720p 7min</p>
        </div>
      </div>
    </div>"#;

    fn engine() -> Xnxx {
        Xnxx::new(&TransportConfig::default()).expect("engine")
    }

    #[test]
    fn parses_packed_metadata() {
        let results = engine().parse_page(FIXTURE).unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.url, "https://www.xnxx.com/video-abc123/clip");
        assert_eq!(r.views_count, 98_700);
        assert_eq!(r.duration_seconds, 420);
        assert_eq!(r.quality.as_deref(), Some("720P"));
    }

    #[test]
    fn search_url_uses_plus_and_offset_pages() {
        assert_eq!(
            engine().search_url("two words", 1),
            "https://www.xnxx.com/search/two+words"
        );
        assert_eq!(
            engine().search_url("q", 3),
            "https://www.xnxx.com/search/q/2"
        );
    }
}
