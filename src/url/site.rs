use crate::UrlError;
use url::Url;

/// Longest label allowed by DNS
const MAX_LABEL_LEN: usize = 63;

/// Expands a site URL template for one subdomain
///
/// The template must contain `{subdomain}` and expand to an absolute
/// HTTP or HTTPS URL with a host.
///
/// # Examples
///
/// ```
/// use civicweb_harvester::url::site_root_for;
///
/// let url = site_root_for("https://{subdomain}.civicweb.net", "springfield").unwrap();
/// assert_eq!(url.host_str(), Some("springfield.civicweb.net"));
/// ```
pub fn site_root_for(template: &str, subdomain: &str) -> Result<Url, UrlError> {
    let expanded = template.replace("{subdomain}", subdomain);
    let url = Url::parse(&expanded).map_err(|e| UrlError::Parse(format!("{}: {}", expanded, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::Parse(format!("{} has no host", expanded)));
    }

    Ok(url)
}

/// Checks that a subdomain is a single DNS label
///
/// Letters, digits and hyphens only; must not start or end with a hyphen.
pub fn validate_subdomain(label: &str) -> Result<(), UrlError> {
    if label.is_empty() {
        return Err(UrlError::InvalidLabel("label cannot be empty".to_string()));
    }

    if label.len() > MAX_LABEL_LEN {
        return Err(UrlError::InvalidLabel(format!(
            "'{}' is longer than {} characters",
            label, MAX_LABEL_LEN
        )));
    }

    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(UrlError::InvalidLabel(format!(
            "'{}' contains characters other than letters, digits and '-'",
            label
        )));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(UrlError::InvalidLabel(format!(
            "'{}' cannot start or end with '-'",
            label
        )));
    }

    Ok(())
}
