//! Capacity handlers.
//!
//! POST /capacity         - register a capacity with its technologies
//! GET  /capacity/all     - paginated listing sorted by name or technology count

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};

use capacity_core::error::{CapacityError, TechnicalMessage};
use capacity_core::model::{Capacity, CapacityList};
use capacity_core::page::CustomPage;
use capacity_core::service::CapacityServicePort;

use crate::dto::{sort_item_from_query, CreateCapacityRequest, MessageResponse, Paging, QueryParams};
use crate::error::AppError;

pub(crate) fn invalid_body(rejection: JsonRejection) -> AppError {
    tracing::warn!(error = %rejection, "unreadable request body");
    CapacityError::InvalidFormatParam(TechnicalMessage::InvalidRequest).into()
}

pub async fn create_capacity(
    Extension(service): Extension<Arc<dyn CapacityServicePort>>,
    payload: Result<Json<CreateCapacityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let Json(request) = payload.map_err(invalid_body)?;
    let saved = service.register_capacity(Capacity::from(request)).await?;
    tracing::info!(capacity_id = ?saved.id, name = %saved.name, "capacity created");
    Ok((
        StatusCode::CREATED,
        Json(TechnicalMessage::CapacityCreated.into()),
    ))
}

pub async fn list_capabilities(
    Extension(service): Extension<Arc<dyn CapacityServicePort>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<CustomPage<CapacityList>>, AppError> {
    let paging = Paging::from_query(&params)?;
    let item = sort_item_from_query(&params)?;
    let page = service
        .list_capabilities(paging.order, item, paging.page, paging.size)
        .await?;
    tracing::debug!(
        sort = paging.order.as_str(),
        parameter = item.as_str(),
        returned = page.data.len(),
        total_items = page.total_items,
        "listed capabilities"
    );
    Ok(Json(page))
}
