use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{to_page, ApiMessage, ApiResponse, AppState};
use crate::application::payments::InitializePaymentRequest;
use crate::domain::payment::{Currency, Payment, PaymentMetadata, PaymentStatus};
use crate::domain::ports::PaymentQuery;
use crate::error::HotelError;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeBody {
    pub amount: Decimal,
    pub email: String,
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: PaymentMetadata,
    /// Acting user, when the caller is authenticated upstream.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeData {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
    pub payment: Payment,
}

pub async fn initialize(
    State(state): State<AppState>,
    Json(body): Json<InitializeBody>,
) -> Result<(StatusCode, Json<ApiResponse<InitializeData>>), HotelError> {
    let request = InitializePaymentRequest {
        amount: body.amount,
        email: body.email,
        name: body.name,
        phone_number: body.phone_number,
        currency: body.currency,
        description: body.description,
        metadata: body.metadata,
    };

    let initialized = state.payments.initialize(body.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            message: "Payment initialized successfully",
            data: InitializeData {
                authorization_url: initialized.authorization_url,
                access_code: initialized.access_code,
                reference: initialized.reference,
                payment: initialized.payment,
            },
        }),
    ))
}

pub async fn verify(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<ApiResponse<Payment>>, HotelError> {
    let payment = state.payments.verify(&reference).await?;
    Ok(Json(ApiResponse {
        message: "Payment verified successfully",
        data: payment,
    }))
}

/// Gateway webhook: the signature is computed over the exact raw bytes, so
/// the body must reach the service unparsed.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiMessage>, HotelError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    state.payments.handle_webhook(&body, signature).await?;

    Ok(Json(ApiMessage {
        message: "Webhook processed successfully",
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentListParams {
    pub status: Option<PaymentStatus>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

impl PaymentListParams {
    fn into_query(self) -> PaymentQuery {
        PaymentQuery {
            status: self.status,
            user_id: self.user_id,
            customer_email: self.email,
            customer_phone: self.phone_number,
        }
    }
}

pub async fn list_for_customer(
    State(state): State<AppState>,
    Query(params): Query<PaymentListParams>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, HotelError> {
    let page = to_page(params.limit, params.page);
    let payments = state
        .payments
        .list_for_customer(params.into_query(), page)
        .await?;
    Ok(Json(ApiResponse {
        message: "Payments retrieved successfully",
        data: payments,
    }))
}

pub async fn list_all(
    State(state): State<AppState>,
    Query(params): Query<PaymentListParams>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, HotelError> {
    let page = to_page(params.limit, params.page);
    let payments = state.payments.list(params.into_query(), page).await?;
    Ok(Json(ApiResponse {
        message: "All payments retrieved successfully",
        data: payments,
    }))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>, HotelError> {
    let payment = state.payments.get(payment_id).await?;
    Ok(Json(ApiResponse {
        message: "Payment retrieved successfully",
        data: payment,
    }))
}
