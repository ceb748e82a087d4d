use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteEntry, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates site entries
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if !sites.iter().any(|site| site.enabled) {
        return Err(ConfigError::Validation(
            "At least one [[site]] must be enabled".to_string(),
        ));
    }

    let mut kinds = HashSet::new();
    for site in sites {
        if !kinds.insert(site.kind) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' is configured more than once",
                site.kind
            )));
        }

        if let Some(base_url) = &site.base_url {
            let url = Url::parse(base_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", base_url, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "base-url '{}' must use HTTP or HTTPS",
                    base_url
                )));
            }
        }

        for country in &site.countries {
            validate_country_code(country)?;
        }
    }

    Ok(())
}

/// Country codes are two lowercase ASCII letters
fn validate_country_code(code: &str) -> Result<(), ConfigError> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(ConfigError::Validation(format!(
            "Invalid country code '{}': expected two lowercase letters (e.g. 'sa')",
            code
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::SiteKind;

    #[test]
    fn test_validate_country_code() {
        assert!(validate_country_code("sa").is_ok());
        assert!(validate_country_code("jp").is_ok());

        assert!(validate_country_code("").is_err());
        assert!(validate_country_code("SA").is_err());
        assert!(validate_country_code("sar").is_err());
        assert!(validate_country_code("s1").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_sites_need_one_enabled() {
        let mut site = SiteEntry::new(SiteKind::MarkaVip);
        site.enabled = false;
        assert!(validate_sites(&[site]).is_err());
        assert!(validate_sites(&[]).is_err());
    }

    #[test]
    fn test_duplicate_site_kind_rejected() {
        let sites = [
            SiteEntry::new(SiteKind::LacosteJp),
            SiteEntry::new(SiteKind::LacosteJp),
        ];
        assert!(validate_sites(&sites).is_err());
    }

    #[test]
    fn test_base_url_must_be_http() {
        let mut site = SiteEntry::new(SiteKind::LacosteTr);
        site.base_url = Some("ftp://lacoste.com.tr".to_string());
        assert!(validate_sites(&[site.clone()]).is_err());

        site.base_url = Some("http://127.0.0.1:8080".to_string());
        assert!(validate_sites(&[site]).is_ok());
    }
}
