//! Per-site engine implementations.
//!
//! One module per upstream. Each declares its selectors (or JSON shapes),
//! its search-URL format and its bang tokens; the shared plumbing lives in
//! [`crate::engine`] and [`crate::parse`].

pub mod eporner;
pub mod motherless;
pub mod pornhub;
pub mod redtube;
pub mod spankbang;
pub mod tube8;
pub mod xhamster;
pub mod xnxx;
pub mod xvideos;
pub mod youporn;

pub use eporner::Eporner;
pub use motherless::Motherless;
pub use pornhub::Pornhub;
pub use redtube::Redtube;
pub use spankbang::SpankBang;
pub use tube8::Tube8;
pub use xhamster::XHamster;
pub use xnxx::Xnxx;
pub use xvideos::XVideos;
pub use youporn::YouPorn;
