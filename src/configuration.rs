use std::{env, fs, ops::Deref, sync::Arc};

use crate::{
    cache::TimedCache, error::Error, handler::ReportSequencer,
    model::AnalyticsReport, provider::HttpApi,
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

/// TTL caches for API responses
#[derive(Debug)]
pub struct ApiCache {
    pub report: TimedCache<AnalyticsReport>,
}

impl ApiCache {
    pub fn new(ttl_seconds: u64) -> Self {
        ApiCache {
            report: TimedCache::new(ttl_seconds),
        }
    }
}

#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub http: HttpApi,
    pub api_cache: ApiCache,
    pub reports: ReportSequencer,
}

impl State {
    pub fn new(config: Config, http: HttpApi) -> State {
        let api_cache = ApiCache::new(config.cache_ttl);
        State {
            config,
            http,
            api_cache,
            reports: ReportSequencer::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub crm_api_url: String,
    pub crm_api_token: Option<String>,
    pub timeout: u64,
    pub page_size: u32,
    pub cache_ttl: u64,
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub static_dir: String,
}

pub fn get_configuration() -> Result<Config, Error> {
    let crm_api_url = env::var("CRM_API_URL")?;
    let crm_api_token =
        env::var("CRM_API_TOKEN").ok().filter(|token| !token.is_empty());
    let timeout = env::var("TIMEOUT")?.parse()?;
    let page_size = env::var("PAGE_SIZE")?.parse()?;
    let cache_ttl = env::var("CACHE_TTL_IN_SECONDS")?.parse()?;

    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let allowed_origins = env::var("ALLOWED_ORIGINS")?
        .split(',')
        .map(|item| item.to_owned())
        .collect::<Vec<String>>();
    let static_dir = format!(
        "{}/{}",
        env!("CARGO_MANIFEST_DIR"),
        env::var("STATIC_DIRECTORY")?
    );

    let config = Config {
        crm_api_url,
        crm_api_token,
        timeout,
        page_size,
        cache_ttl,
        server_host,
        port,
        allowed_origins,
        static_dir,
    };

    Ok(config)
}

pub fn set_configuration() -> Result<(), Error> {
    let config_file: &str = ".env";

    let directory = env!("CARGO_MANIFEST_DIR");
    let path = format!("{}/{}", directory, config_file);

    let config_string = fs::read_to_string(path)?;
    parse_config_string(config_string)?;

    Ok(())
}

fn parse_config_string(config: String) -> Result<(), Error> {
    let params: Vec<Option<(&str, &str)>> = config
        .split('\n')
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|s| {
            let element = s.find('=');
            if let Some(e) = element {
                return Some(s.split_at(e));
            }
            None
        })
        .map(|value| {
            if let Some((k, v)) = value {
                return Some((k, &v[1..]));
            }
            None
        })
        .collect();

    for (key, value) in params.into_iter().flatten() {
        env::set_var(key, value);
    }

    Ok(())
}
