//! Shared request/response plumbing: pagination and lenient deserializers
//! for the loosely-typed inputs inherited from the external catalog.

use serde::{Deserialize, Deserializer};

/// Pagination query parameters shared by all list/search endpoints
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size (default: 20)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl PageQuery {
    /// Clamp page and limit to at least 1
    pub fn normalized(&self) -> (u32, u32) {
        (self.page.max(1), self.limit.max(1))
    }
}

/// Query parameters for free-text search endpoints
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search keyword
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl SearchQuery {
    pub fn normalized(&self) -> (u32, u32) {
        (self.page.max(1), self.limit.max(1))
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

/// Number of pages needed to cover `total` records at `limit` per page
pub fn page_count(total: usize, limit: u32) -> u32 {
    (total as u32 + limit - 1) / limit
}

/// Accept a single string or a sequence of strings, normalized to one
/// `/`-joined string. Used for the `authors` field.
pub fn deserialize_string_or_seq<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;
    match value {
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Array(arr)) => {
            let parts: Vec<String> = arr
                .into_iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect();
            if parts.is_empty() {
                Ok(None)
            } else {
                Ok(Some(parts.join("/")))
            }
        }
        _ => Ok(None),
    }
}

/// Accept a number or a numeric string; null, empty, and non-numeric input
/// all become None so the caller's default applies.
pub fn deserialize_number_or_string<'de, D>(
    deserializer: D,
) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Accept a string or a number, kept as an opaque display string; null and
/// empty strings become None.
pub fn deserialize_display_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct AuthorsProbe {
        #[serde(default, deserialize_with = "deserialize_string_or_seq")]
        authors: Option<String>,
    }

    #[derive(Deserialize)]
    struct NumberProbe {
        #[serde(default, deserialize_with = "deserialize_number_or_string")]
        value: Option<f64>,
    }

    #[derive(Deserialize)]
    struct DisplayProbe {
        #[serde(default, deserialize_with = "deserialize_display_string")]
        value: Option<String>,
    }

    #[test]
    fn test_authors_accepts_string_or_sequence() {
        let p: AuthorsProbe = serde_json::from_str(r#"{"authors": "Frank Herbert"}"#).unwrap();
        assert_eq!(p.authors.as_deref(), Some("Frank Herbert"));

        let p: AuthorsProbe =
            serde_json::from_str(r#"{"authors": ["Terry Pratchett", "Neil Gaiman"]}"#).unwrap();
        assert_eq!(p.authors.as_deref(), Some("Terry Pratchett/Neil Gaiman"));

        let p: AuthorsProbe = serde_json::from_str(r#"{"authors": []}"#).unwrap();
        assert!(p.authors.is_none());

        let p: AuthorsProbe = serde_json::from_str(r#"{}"#).unwrap();
        assert!(p.authors.is_none());
    }

    #[test]
    fn test_number_or_string_coercion() {
        let p: NumberProbe = serde_json::from_str(r#"{"value": 3}"#).unwrap();
        assert_eq!(p.value, Some(3.0));

        let p: NumberProbe = serde_json::from_str(r#"{"value": "12.5"}"#).unwrap();
        assert_eq!(p.value, Some(12.5));

        let p: NumberProbe = serde_json::from_str(r#"{"value": ""}"#).unwrap();
        assert!(p.value.is_none());

        let p: NumberProbe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert!(p.value.is_none());

        let p: NumberProbe = serde_json::from_str(r#"{"value": "many"}"#).unwrap();
        assert!(p.value.is_none());
    }

    #[test]
    fn test_display_string_coercion() {
        let p: DisplayProbe = serde_json::from_str(r#"{"value": 4.02}"#).unwrap();
        assert_eq!(p.value.as_deref(), Some("4.02"));

        let p: DisplayProbe = serde_json::from_str(r#"{"value": " 0345391802 "}"#).unwrap();
        assert_eq!(p.value.as_deref(), Some("0345391802"));

        let p: DisplayProbe = serde_json::from_str(r#"{"value": "  "}"#).unwrap();
        assert!(p.value.is_none());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(25, 10), 3);
    }

    #[test]
    fn test_page_query_normalization() {
        let q = PageQuery { page: 0, limit: 0 };
        assert_eq!(q.normalized(), (1, 1));
        let q = PageQuery { page: 2, limit: 10 };
        assert_eq!(q.normalized(), (2, 10));
    }
}
