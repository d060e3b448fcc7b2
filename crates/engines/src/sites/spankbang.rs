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
    hd_badge: Selector,
}

// SpankBang uses terse single-letter classes on its tiles.
static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("div.main_results"),
    item: selector("div.video-item"),
    link: selector("a.n"),
    img: selector("a.thumb img"),
    duration: selector("span.l"),
    views: selector("span.v"),
    hd_badge: selector("span.h"),
});

static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(SpankBang::BASE_URL).expect("base url"));

pub struct SpankBang {
    engine: Engine,
}

impl SpankBang {
    pub const BASE_URL: &str = "https://spankbang.com";

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
            engine: Engine::new(
                "spankbang",
                "SpankBang",
                Self::BASE_URL,
                2,
                capabilities,
                transport,
            )?,
        })
    }
}

impl SearchEngine for SpankBang {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["sb", "spankbang"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let encoded = urlencoding::encode(query).into_owned().replace("%20", "+");
        format!("{}/s/{}/{}/", Self::BASE_URL, encoded, page.max(1))
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let document = Html::parse_document(body);
        let s = &*SELECTORS;

        if document.select(&s.container).next().is_none() {
            return Err(EngineError::Parse("results container not found".to_string()));
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
            if let Some(el) = item.select(&s.hd_badge).next() {
                let badge = text_of(el);
                if !badge.is_empty() {
                    result.quality = Some(badge);
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
    <div class="main_results">
      <div class="video-item">
        <a class="thumb" href="/7xk9a/video/slug">
          <img data-src="https://tbi.sb-cd.com/t.jpg" data-preview="https://tbv.sb-cd.com/p.mp4">
        </a>
        <a class="n" href="/7xk9a/video/slug">SB clip</a>
        <span class="l">32:10</span>
        <span class="v">4.1M</span>
        <span class="h">4K</span>
      </div>
    </div>"#;

    fn engine() -> SpankBang {
        SpankBang::new(&TransportConfig::default()).expect("engine")
    }

    #[test]
    fn parses_terse_tiles() {
        let results = engine().parse_page(FIXTURE).unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.url, "https://spankbang.com/7xk9a/video/slug");
        assert_eq!(r.duration_seconds, 1930);
        assert_eq!(r.views_count, 4_100_000);
        assert_eq!(r.quality.as_deref(), Some("4K"));
    }

    #[test]
    fn search_url_always_carries_page() {
        assert_eq!(
            engine().search_url("vr", 1),
            "https://spankbang.com/s/vr/1/"
        );
        assert_eq!(
            engine().search_url("vr", 5),
            "https://spankbang.com/s/vr/5/"
        );
    }
}
