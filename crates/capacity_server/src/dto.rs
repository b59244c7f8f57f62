//! Request/response bodies and query-string parsing.
//!
//! Body fields are optional on the wire; absent values reach the use case's
//! required-field checks rather than failing deserialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use capacity_core::error::{CapacityError, TechnicalMessage};
use capacity_core::model::{Capacity, SortItem, SortOrder};

pub const DEFAULT_PAGE: i64 = 0;
pub const DEFAULT_SIZE: i64 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct CreateCapacityRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<i64>>,
}

impl From<CreateCapacityRequest> for Capacity {
    fn from(req: CreateCapacityRequest) -> Self {
        Capacity::new(
            req.name.unwrap_or_default(),
            req.description.unwrap_or_default(),
            req.technologies.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignCapabilitiesRequest {
    pub bootcamp_id: Option<i64>,
    pub capabilities_ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl From<TechnicalMessage> for MessageResponse {
    fn from(message: TechnicalMessage) -> Self {
        Self {
            message: message.message(),
        }
    }
}

fn invalid_parameters() -> CapacityError {
    CapacityError::InvalidFormatParam(TechnicalMessage::InvalidParameters)
}

/// Raw query parameters, already percent-decoded.
pub type QueryParams = HashMap<String, String>;

/// Sort direction and paging shared by both listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub order: SortOrder,
    pub page: i64,
    pub size: i64,
}

impl Paging {
    pub fn from_query(params: &QueryParams) -> Result<Self, CapacityError> {
        let order = match params.get("sort") {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw).ok_or_else(invalid_parameters)?,
        };
        let page = parse_number(params.get("page"), DEFAULT_PAGE)?;
        let size = parse_number(params.get("size"), DEFAULT_SIZE)?;
        if page < 0 || size <= 0 {
            return Err(invalid_parameters());
        }
        Ok(Self { order, page, size })
    }
}

pub fn sort_item_from_query(params: &QueryParams) -> Result<SortItem, CapacityError> {
    match params.get("parameter") {
        None => Ok(SortItem::default()),
        Some(raw) => SortItem::parse(raw).ok_or_else(invalid_parameters),
    }
}

fn parse_number(raw: Option<&String>, default: i64) -> Result<i64, CapacityError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| invalid_parameters()),
    }
}

/// Comma-separated id list. Absent or blank yields an empty list.
pub fn parse_id_list(raw: Option<&String>) -> Result<Vec<i64>, CapacityError> {
    let Some(raw) = raw.map(|r| r.trim()).filter(|r| !r.is_empty()) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(|part| part.trim().parse::<i64>().map_err(|_| invalid_parameters()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn paging_defaults() {
        let paging = Paging::from_query(&QueryParams::new()).unwrap();
        assert_eq!(
            paging,
            Paging {
                order: SortOrder::Ascending,
                page: 0,
                size: 10
            }
        );
        assert_eq!(
            sort_item_from_query(&QueryParams::new()).unwrap(),
            SortItem::Name
        );
    }

    #[test]
    fn paging_parses_lowercase_sort() {
        let paging = Paging::from_query(&params(&[("sort", "desc"), ("page", "2"), ("size", "5")]))
            .unwrap();
        assert_eq!(paging.order, SortOrder::Descending);
        assert_eq!(paging.page, 2);
        assert_eq!(paging.size, 5);
    }

    #[test]
    fn paging_rejects_bad_values() {
        for bad in [
            params(&[("sort", "sideways")]),
            params(&[("page", "-1")]),
            params(&[("size", "0")]),
            params(&[("size", "ten")]),
        ] {
            assert!(matches!(
                Paging::from_query(&bad),
                Err(CapacityError::InvalidFormatParam(
                    TechnicalMessage::InvalidParameters
                ))
            ));
        }
        assert!(sort_item_from_query(&params(&[("parameter", "color")])).is_err());
    }

    #[test]
    fn id_lists() {
        assert_eq!(parse_id_list(None).unwrap(), Vec::<i64>::new());
        assert_eq!(
            parse_id_list(Some(&"1, 2,3".to_string())).unwrap(),
            vec![1, 2, 3]
        );
        assert!(parse_id_list(Some(&"1,x".to_string())).is_err());
    }

    #[test]
    fn create_request_fills_missing_fields_with_empty_values() {
        let req: CreateCapacityRequest = serde_json::from_str(r#"{"name": "Backend"}"#).unwrap();
        let capacity = Capacity::from(req);
        assert_eq!(capacity.name, "Backend");
        assert!(capacity.description.is_empty());
        assert!(capacity.technologies.is_empty());
        assert!(capacity.id.is_none());
    }
}
