mod http_conversion_api;

pub use http_conversion_api::HttpConversionApi;
