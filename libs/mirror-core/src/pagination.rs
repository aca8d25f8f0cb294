use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::filter::{tokenize, SortOrder};

/// Characters left as-is in rebuilt query strings.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':');

/// `links` object of every list response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
pub struct Links {
    pub next: Option<String>,
}

/// URL of the page following the one that ended at `anchor_value`.
///
/// Continuation predicates already on `anchor_field` that point in the
/// direction of `order` are replaced by a single strict `gt:`/`lt:` at the
/// anchor. Every other parameter is carried over in its original position.
/// `None` on the last page.
pub fn next_link(
    path: &str,
    query: Option<&str>,
    is_last_page: bool,
    anchor_field: &str,
    anchor_value: &str,
    order: SortOrder,
) -> Option<String> {
    if is_last_page {
        return None;
    }

    let mut params: Vec<(String, String)> = url::form_urlencoded::parse(
        query.unwrap_or_default().as_bytes(),
    )
    .into_owned()
    .filter(|(key, value)| {
        !(key.eq_ignore_ascii_case(anchor_field)
            && matches!(tokenize(value), Ok((op, _)) if order.is_continuation(op)))
    })
    .collect();

    params.push((
        anchor_field.to_string(),
        format!("{}:{anchor_value}", order.continuation_operator()),
    ));

    let query = params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_VALUE),
                utf8_percent_encode(v, QUERY_VALUE)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    Some(format!("{path}?{query}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_has_no_link() {
        assert_eq!(
            next_link("/api/v1/accounts", None, true, "account.id", "0.0.5", SortOrder::Asc),
            None
        );
    }

    #[test]
    fn appends_strict_continuation() {
        let link = next_link(
            "/api/v1/accounts",
            Some("limit=2"),
            false,
            "account.id",
            "0.0.5",
            SortOrder::Asc,
        );
        assert_eq!(
            link.as_deref(),
            Some("/api/v1/accounts?limit=2&account.id=gt:0.0.5")
        );
    }

    #[test]
    fn replaces_previous_continuation_but_keeps_opposite_bound() {
        let link = next_link(
            "/api/v1/accounts",
            Some("account.id=gte:0.0.1&account.id=lt:0.0.90&order=asc&limit=10"),
            false,
            "account.id",
            "0.0.20",
            SortOrder::Asc,
        )
        .unwrap();
        assert_eq!(
            link,
            "/api/v1/accounts?account.id=lt:0.0.90&order=asc&limit=10&account.id=gt:0.0.20"
        );
    }

    #[test]
    fn descending_uses_lt() {
        let link = next_link(
            "/api/v1/topics/0.0.7/messages",
            Some("order=desc&sequencenumber=lte:50"),
            false,
            "sequencenumber",
            "41",
            SortOrder::Desc,
        )
        .unwrap();
        assert_eq!(
            link,
            "/api/v1/topics/0.0.7/messages?order=desc&sequencenumber=lt:41"
        );
    }

    #[test]
    fn is_deterministic_and_escapes() {
        let run = || {
            next_link(
                "/api/v1/tokens",
                Some("name=a%20b&limit=5"),
                false,
                "token.id",
                "0.0.9",
                SortOrder::Asc,
            )
        };
        let first = run().unwrap();
        assert_eq!(first, run().unwrap());
        assert_eq!(first, "/api/v1/tokens?name=a%20b&limit=5&token.id=gt:0.0.9");
    }
}
