pub mod api;
pub mod cache;
pub mod fallback;
pub mod fetch;
pub mod http;
pub mod prefs;
