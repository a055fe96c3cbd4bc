use std::collections::HashMap;

/// Parse query parameters from a URI string
///
/// Handles URL decoding and returns a HashMap of parameter key-value pairs.
/// Multiple values for the same key are not supported (only the last is kept).
pub fn parse_query_params(uri: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    if let Some(query_start) = uri.find('?') {
        let query = &uri[query_start + 1..];
        for param in query.split('&').filter(|p| !p.is_empty()) {
            if let Some(eq_idx) = param.find('=') {
                let key = &param[..eq_idx];
                let encoded_value = param[eq_idx + 1..].replace('+', " ");
                let decoded = urlencoding::decode(&encoded_value)
                    .map(|v| v.into_owned())
                    .unwrap_or(encoded_value);
                params.insert(key.to_string(), decoded);
            } else {
                // Flag parameter without value
                params.insert(param.to_string(), String::new());
            }
        }
    }

    params
}

/// Get a string parameter from parsed query params with optional default
pub fn get_string(params: &HashMap<String, String>, key: &str, default: Option<&str>) -> Option<String> {
    params
        .get(key)
        .cloned()
        .or_else(|| default.map(|d| d.to_string()))
}

/// Get an integer parameter with validation and default
pub fn get_int(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
        .max(1)
}

/// Get a sequence number; missing or malformed means "from the start".
pub fn get_seq(params: &HashMap<String, String>, key: &str) -> u64 {
    params
        .get(key)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_values() {
        let params = parse_query_params("/shayaris?author=Mirza%20Ghalib&page=2&flag");
        assert_eq!(params.get("author"), Some(&"Mirza Ghalib".to_string()));
        assert_eq!(get_int(&params, "page", 1), 2);
        assert_eq!(params.get("flag"), Some(&String::new()));
    }

    #[test]
    fn plus_is_a_space() {
        let params = parse_query_params("/profiles/search?q=dard+e+dil");
        assert_eq!(get_string(&params, "q", None).as_deref(), Some("dard e dil"));
    }

    #[test]
    fn defaults_apply() {
        let params = parse_query_params("/changes");
        assert_eq!(get_seq(&params, "since"), 0);
        assert_eq!(get_int(&params, "limit", 5), 5);
        assert_eq!(get_string(&params, "status", Some("all")).as_deref(), Some("all"));
    }
}
