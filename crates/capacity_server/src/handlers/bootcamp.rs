//! Bootcamp-facing handlers.
//!
//! POST   /capacity/assign          - link capacities to a bootcamp
//! GET    /capacity/bootcamps_ids   - capacities (with technologies) per bootcamp id
//! GET    /capacity/bootcamps       - bootcamps paginated by capacity count
//! DELETE /capacity/bootcamp/:id    - drop a bootcamp's capacities

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::{Extension, Json};

use capacity_core::error::{CapacityError, TechnicalMessage};
use capacity_core::model::CapabilitiesPerBootcamp;
use capacity_core::page::CustomPage;
use capacity_core::service::CapacityServicePort;

use crate::dto::{parse_id_list, AssignCapabilitiesRequest, MessageResponse, Paging, QueryParams};
use crate::error::AppError;
use crate::handlers::capacity::invalid_body;

pub async fn assign_capabilities(
    Extension(service): Extension<Arc<dyn CapacityServicePort>>,
    payload: Result<Json<AssignCapabilitiesRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload.map_err(invalid_body)?;
    let bootcamp_id = request
        .bootcamp_id
        .ok_or(CapacityError::ParamRequiredMissing(
            TechnicalMessage::MissingRequiredParam,
        ))?;
    let ids = request.capabilities_ids.unwrap_or_default();

    service
        .assign_capabilities_to_bootcamp(bootcamp_id, &ids)
        .await?;
    tracing::info!(bootcamp_id, count = ids.len(), "capabilities assigned");
    Ok(Json(TechnicalMessage::AssignCapabilitiesOk.into()))
}

pub async fn capabilities_by_bootcamps_ids(
    Extension(service): Extension<Arc<dyn CapacityServicePort>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<CapabilitiesPerBootcamp>>, AppError> {
    let bootcamp_ids = parse_id_list(params.get("capabilitiesIds"))?;
    let bootcamps = service
        .get_capabilities_by_bootcamps_ids(&bootcamp_ids)
        .await?;
    tracing::info!(requested = bootcamp_ids.len(), returned = bootcamps.len(), "got bootcamp capabilities");
    Ok(Json(bootcamps))
}

pub async fn bootcamps_sorted_by_capabilities(
    Extension(service): Extension<Arc<dyn CapacityServicePort>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<CustomPage<CapabilitiesPerBootcamp>>, AppError> {
    let paging = Paging::from_query(&params)?;
    let page = service
        .get_sort_capabilities_by_bootcamps(paging.order, paging.page, paging.size)
        .await?;
    tracing::info!(
        sort = paging.order.as_str(),
        returned = page.data.len(),
        total_items = page.total_items,
        "got bootcamps sorted by capabilities"
    );
    Ok(Json(page))
}

pub async fn delete_capabilities_by_bootcamp(
    Extension(service): Extension<Arc<dyn CapacityServicePort>>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let bootcamp_id: i64 = raw_id
        .trim()
        .parse()
        .map_err(|_| CapacityError::InvalidFormatParam(TechnicalMessage::InvalidParameters))?;
    delete_for(service.as_ref(), Some(bootcamp_id)).await
}

/// DELETE /capacity/bootcamp with no id segment.
pub async fn delete_capabilities_without_id(
    Extension(service): Extension<Arc<dyn CapacityServicePort>>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_for(service.as_ref(), None).await
}

async fn delete_for(
    service: &dyn CapacityServicePort,
    bootcamp_id: Option<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    service.delete_capabilities_by_bootcamp_id(bootcamp_id).await?;
    tracing::info!(?bootcamp_id, "bootcamp capabilities deleted");
    Ok(Json(TechnicalMessage::DeleteCapabilitiesOk.into()))
}
