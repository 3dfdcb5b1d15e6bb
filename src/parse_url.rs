use anyhow::{bail, Result};
use regex::Regex;
use std::collections::HashMap;
use urlencoding;

pub fn get_query(url: &str) -> Result<HashMap<String, String>> {
    let url_re = Regex::new(r".*\?").unwrap();
    let query = url_re.replace(url, "");
    let mut vars: HashMap<String, String> = HashMap::new();

    for pair in query.split('&') {
        let var = pair.split('=').collect::<Vec<&str>>();
        if var.len() == 2 {
            let value = urlencoding::decode(var[1])?;
            vars.insert(var[0].to_string(), value.to_string());
            continue;
        }
        bail!("Unable to process URL Query: malformed URL");
    }

    Ok(vars)
}

/// Extracts the bind target from a redirect URI. A URI that names no port
/// falls back to 8080, so the listener does not need a privileged port.
pub fn host_and_port(uri: &str) -> Result<(String, u16)> {
    let scheme_re = Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").unwrap();
    let rest = scheme_re.replace(uri, "");
    let authority = rest.split('/').next().unwrap_or("");

    if authority.is_empty() {
        bail!("Unable to read host from redirect URI '{}'", uri);
    }

    let mut parts = authority.splitn(2, ':');
    let host = parts.next().unwrap().to_string();
    let port = match parts.next() {
        Some(p) => match p.parse::<u16>() {
            Ok(p) => p,
            Err(e) => bail!("Invalid port in redirect URI '{}'.\nDetails: {}", uri, e),
        },
        None => 8080,
    };

    Ok((host, port))
}
