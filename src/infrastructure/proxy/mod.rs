//! Image proxy adapter.

mod image_proxy;

pub use image_proxy::{
    DEFAULT_CONTENT_TYPE, DEFAULT_PROXY_TIMEOUT, HttpImageProxy, is_public_host, referer_for,
    validate_url,
};
