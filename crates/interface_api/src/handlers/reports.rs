//! Report and navigation handlers

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use domain_access::{sections_for, Principal};
use domain_billing::{BillingSummary, GstReport};

use crate::dto::billing::{GstReportQuery, SectionResponse};
use crate::{error::ApiError, AppState};

/// Revenue, outstanding and conversion figures visible to the caller
pub async fn billing_summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<BillingSummary>, ApiError> {
    Ok(Json(state.engine.billing_summary(&principal).await?))
}

/// GST collected per slab over an inclusive invoice-date range
pub async fn gst_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<GstReportQuery>,
) -> Result<Json<GstReport>, ApiError> {
    Ok(Json(state.engine.gst_report(&principal, query.from, query.to).await?))
}

/// Dashboard sections the caller may enter, in sidebar order
pub async fn my_sections(Extension(principal): Extension<Principal>) -> Json<Vec<SectionResponse>> {
    Json(
        sections_for(principal.role)
            .into_iter()
            .map(SectionResponse::from)
            .collect(),
    )
}
