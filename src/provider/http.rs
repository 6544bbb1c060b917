use reqwest::Client;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::{
    configuration::Config,
    error::Error,
    model::{Contract, ContractsPage},
};

/// Client for the CRM REST API, the only data source of this service.
#[derive(Debug)]
pub struct HttpApi {
    config: Config,
    pub client: Client,
}

impl HttpApi {
    pub fn new(config: Config) -> Result<HttpApi, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(HttpApi { config, client })
    }

    /// Fetch the complete contract list, following the list endpoint's
    /// `next` links until the last page. Aggregation always runs over
    /// the full record set.
    pub async fn get_contracts(&self) -> Result<Vec<Contract>, Error> {
        let mut url = self.contracts_url()?;
        let mut contracts: Vec<Contract> = Vec::new();

        loop {
            info!("{}", &url);
            let mut request = self.client.get(url.clone());
            if let Some(token) = &self.config.crm_api_token {
                request = request.bearer_auth(token);
            }

            let page = request
                .send()
                .await?
                .error_for_status()?
                .json::<ContractsPage>()
                .await?;
            contracts.extend(page.results);

            match page.next {
                Some(next) => url = Url::parse(&next)?,
                None => break,
            }
        }

        Ok(contracts)
    }

    fn contracts_url(&self) -> Result<Url, Error> {
        let mut base = self.config.crm_api_url.to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }
        let mut url = Url::parse(&base)?.join("crm/contracts/")?;
        url.query_pairs_mut()
            .append_pair("page_size", &self.config.page_size.to_string());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str) -> Config {
        Config {
            crm_api_url: api_url.to_string(),
            crm_api_token: None,
            timeout: 10,
            page_size: 500,
            cache_ttl: 60,
            server_host: "127.0.0.1".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            static_dir: "static".to_string(),
        }
    }

    #[test]
    fn contracts_url_joins_with_and_without_trailing_slash() {
        for base in ["http://localhost:8000/api", "http://localhost:8000/api/"] {
            let api = HttpApi::new(config(base)).unwrap();
            let url = api.contracts_url().unwrap();
            assert_eq!(
                url.as_str(),
                "http://localhost:8000/api/crm/contracts/?page_size=500"
            );
        }
    }
}
