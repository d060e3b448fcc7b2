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
    uploader: Selector,
    premium: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("div.thumb-list"),
    item: selector("div.thumb-list__item.video-thumb"),
    link: selector("a.video-thumb-info__name"),
    img: selector("img.thumb-image-container__image"),
    duration: selector("div[data-role='video-duration']"),
    views: selector("div.video-thumb-views"),
    uploader: selector("a.video-uploader__name"),
    premium: selector("i.xh-icon.premium"),
});

static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(XHamster::BASE_URL).expect("base url"));

pub struct XHamster {
    engine: Engine,
}

impl XHamster {
    pub const BASE_URL: &str = "https://xhamster.com";

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
            engine: Engine::new("xhamster", "xHamster", Self::BASE_URL, 2, capabilities, transport)?,
        })
    }
}

impl SearchEngine for XHamster {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["xh", "xhamster"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let encoded = urlencoding::encode(query).into_owned().replace("%20", "+");
        if page > 1 {
            format!("{}/search/{}?page={}", Self::BASE_URL, encoded, page)
        } else {
            format!("{}/search/{}", Self::BASE_URL, encoded)
        }
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let document = Html::parse_document(body);
        let s = &*SELECTORS;

        if document.select(&s.container).next().is_none() {
            return Err(EngineError::Parse("thumb list not found".to_string()));
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
            if let Some(el) = item.select(&s.uploader).next() {
                let name = text_of(el);
                if !name.is_empty() {
                    result.performer = Some(name);
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
    <div class="thumb-list thumb-list--sidebar">
      <div class="thumb-list__item video-thumb">
        <a class="video-thumb__image-container" href="/videos/clip-123">
          <img class="thumb-image-container__image" src="https://ic-vt.xhcdn.com/t.jpg"
               data-preview="https://ic-vt.xhcdn.com/p.mp4">
        </a>
        <div data-role="video-duration">14:59</div>
        <a class="video-thumb-info__name" href="/videos/clip-123">Named clip</a>
        <div class="video-thumb-views">2.3M views</div>
        <a class="video-uploader__name" href="/users/u1">uploader1</a>
      </div>
    </div>"#;

    fn engine() -> XHamster {
        XHamster::new(&TransportConfig::default()).expect("engine")
    }

    #[test]
    fn parses_thumb_list() {
        let results = engine().parse_page(FIXTURE).unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.url, "https://xhamster.com/videos/clip-123");
        assert_eq!(r.title, "Named clip");
        assert_eq!(r.duration_seconds, 899);
        assert_eq!(r.views_count, 2_300_000);
        assert_eq!(r.performer.as_deref(), Some("uploader1"));
        assert_eq!(r.preview_url.as_deref(), Some("https://ic-vt.xhcdn.com/p.mp4"));
    }

    #[test]
    fn search_url_pages() {
        assert_eq!(
            engine().search_url("step mom", 1),
            "https://xhamster.com/search/step+mom"
        );
        assert!(engine().search_url("q", 4).ends_with("?page=4"));
    }
}
