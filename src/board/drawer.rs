//! Deal drawer state and its `?deal=<id>` deep link.

use dealboard_common::DealId;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Query parameter carrying the open deal.
pub const DRAWER_PARAM: &str = "deal";

// Only used to give relative links something to resolve against.
const LINK_BASE: &str = "http://board.local/";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerState {
    pub deal_id: Option<DealId>,
}

impl DrawerState {
    pub fn open(&mut self, id: DealId) {
        self.deal_id = Some(id);
    }

    pub fn close(&mut self) {
        self.deal_id = None;
    }

    pub fn is_open(&self) -> bool {
        self.deal_id.is_some()
    }

    /// Read drawer state from a full URL, a path with a query, or a bare
    /// query string. An absent or empty `deal` parameter means closed.
    pub fn from_link(link: &str) -> Self {
        let url = Url::parse(link).or_else(|_| {
            let relative = if link.starts_with('/') || link.starts_with('?') {
                link.to_string()
            } else {
                format!("?{}", link)
            };
            Url::parse(LINK_BASE).and_then(|base| base.join(&relative))
        });

        let deal_id = url.ok().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == DRAWER_PARAM)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
                .map(DealId::from)
        });
        Self { deal_id }
    }

    /// Query string (without `?`) that reopens this drawer; empty when
    /// closed.
    pub fn to_query(&self) -> String {
        let Some(id) = &self.deal_id else {
            return String::new();
        };
        Url::parse_with_params(LINK_BASE, &[(DRAWER_PARAM, id.as_str())])
            .ok()
            .and_then(|url| url.query().map(str::to_string))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bare_query() {
        let drawer = DrawerState::from_link("tab=pipeline&deal=d1");
        assert_eq!(drawer.deal_id, Some(DealId::new("d1")));
    }

    #[test]
    fn test_from_query_with_question_mark() {
        let drawer = DrawerState::from_link("?deal=42");
        assert_eq!(drawer.deal_id, Some(DealId::new("42")));
    }

    #[test]
    fn test_from_full_url() {
        let drawer = DrawerState::from_link("https://console.example.com/crm/pipeline?deal=abc%2F1");
        assert_eq!(drawer.deal_id, Some(DealId::new("abc/1")));
    }

    #[test]
    fn test_from_path_with_query() {
        let drawer = DrawerState::from_link("/crm/pipeline?deal=d7");
        assert_eq!(drawer.deal_id, Some(DealId::new("d7")));
    }

    #[test]
    fn test_missing_or_empty_param_is_closed() {
        assert!(!DrawerState::from_link("tab=pipeline").is_open());
        assert!(!DrawerState::from_link("deal=").is_open());
        assert!(!DrawerState::from_link("").is_open());
    }

    #[test]
    fn test_to_query_encodes_id() {
        let mut drawer = DrawerState::default();
        assert_eq!(drawer.to_query(), "");
        drawer.open(DealId::new("a b/c"));
        let query = drawer.to_query();
        assert_eq!(query, "deal=a+b%2Fc");
        assert_eq!(DrawerState::from_link(&query), drawer);
    }

    #[test]
    fn test_open_close() {
        let mut drawer = DrawerState::default();
        drawer.open(DealId::new("d1"));
        assert!(drawer.is_open());
        drawer.close();
        assert!(!drawer.is_open());
    }
}
