pub use self::http::HttpApi;

mod http;
