use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;

use super::errors::CheckoutError;
use super::schemas::{
    ChangePaymentMethodQuery, ChangePaymentMethodResponse, CreateOrderRequest,
    CreateOrderResponse, OrderPreview, OrderStatus, PaymentInfoResponse, PaymentMethod,
    PaymentStatusResponse, PreviewOrderRequest, SePayWebhookRequest, WebhookResponse,
};
use super::utils::{
    cancel_customer_order, change_payment_method, create_order, fetch_current_user_order,
    fetch_latest_payment, payment_status_of, preview_order, reconcile_bank_transfer,
};
use crate::configuration::SePaySettings;
use crate::constants::SEPAY_SIGNATURE_HEADER;
use crate::errors::GenericError;
use crate::routes::user::schemas::UserAccount;
use crate::routes::voucher::schemas::{ValidateVoucherRequest, VoucherEvaluation};
use crate::routes::voucher::utils::validate_voucher_code;
use crate::schemas::GenericResponse;
use crate::sepay_client::{SePayClient, SignatureCheck};

#[utoipa::path(
    post,
    path = "/checkout/preview",
    tag = "Checkout",
    request_body(content = PreviewOrderRequest, description = "Request Body"),
    responses(
        (status=200, description= "Priced order preview", body= GenericResponse<OrderPreview>),
        (status=400, description= "Invalid items or address", body= GenericResponse<TupleUnit>),
        (status=404, description= "Variant not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Insufficient stock", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Preview Order API", skip(pool, user, body), fields(user_id = %user.id))]
pub async fn preview_order_req(
    body: PreviewOrderRequest,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<OrderPreview>>, GenericError> {
    let preview = preview_order(
        &pool,
        user.id,
        &body.items,
        body.voucher_code.as_deref(),
        body.address_id,
    )
    .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully previewed order",
        Some(preview),
    )))
}

#[utoipa::path(
    post,
    path = "/checkout/validate-voucher",
    tag = "Checkout",
    request_body(content = ValidateVoucherRequest, description = "Request Body"),
    responses(
        (status=200, description= "Voucher evaluation", body= GenericResponse<VoucherEvaluation>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Validate Voucher API", skip(pool, user), fields(user_id = %user.id))]
pub async fn validate_voucher_req(
    body: ValidateVoucherRequest,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<VoucherEvaluation>>, GenericError> {
    if body.subtotal < BigDecimal::from(0) {
        return Err(GenericError::ValidationError(
            "Subtotal cannot be negative".to_string(),
        ));
    }
    let evaluation = validate_voucher_code(&pool, &body.code, &body.subtotal).await?;
    Ok(web::Json(GenericResponse::success(
        &evaluation.message,
        Some(evaluation.clone()),
    )))
}

#[utoipa::path(
    post,
    path = "/checkout/create-order",
    tag = "Checkout",
    request_body(content = CreateOrderRequest, description = "Request Body"),
    responses(
        (status=200, description= "Order created", body= GenericResponse<CreateOrderResponse>),
        (status=400, description= "Invalid items or address", body= GenericResponse<TupleUnit>),
        (status=404, description= "Variant not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Insufficient stock or voucher exhausted", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Create Order API", skip(pool, user, body, sepay_client), fields(user_id = %user.id))]
pub async fn create_order_req(
    body: CreateOrderRequest,
    pool: web::Data<PgPool>,
    sepay_client: web::Data<SePayClient>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<CreateOrderResponse>>, GenericError> {
    let (order, _) = create_order(&pool, user.id, &body).await?;
    let (payment_url, payment_content) = match order.payment_method {
        PaymentMethod::Sepay => {
            let content = SePayClient::payment_content(&order.payment_code);
            (
                Some(sepay_client.qr_url(&order.final_amount, &content)),
                Some(content),
            )
        }
        PaymentMethod::Cod => (None, None),
    };
    Ok(web::Json(GenericResponse::success(
        "Successfully created order",
        Some(CreateOrderResponse {
            order_id: order.id,
            status: order.status,
            payment_method: order.payment_method,
            total_amount: order.total_amount,
            discount_amount: order.discount_amount,
            final_amount: order.final_amount,
            payment_code: order.payment_code,
            payment_url,
            payment_content,
            created_on: order.created_on,
        }),
    )))
}

#[utoipa::path(
    get,
    path = "/checkout/payment-status/{id}",
    tag = "Checkout",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status=200, description= "Order and payment status", body= GenericResponse<PaymentStatusResponse>),
        (status=404, description= "Order not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Payment Status API", skip(pool, user, sepay_settings), fields(user_id = %user.id))]
pub async fn payment_status_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    sepay_settings: web::Data<SePaySettings>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<PaymentStatusResponse>>, GenericError> {
    let timeout = sepay_settings.payment_timeout_minutes;
    let order = fetch_current_user_order(&pool, user.id, path.into_inner(), timeout).await?;
    let payment = fetch_latest_payment(pool.get_ref(), order.id).await?;
    let (payment_status, transaction_id) = payment_status_of(payment.as_ref());
    let now = Utc::now();
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched payment status",
        Some(PaymentStatusResponse {
            order_id: order.id,
            order_status: order.status,
            payment_method: order.payment_method,
            payment_status,
            transaction_id,
            is_payment_expired: order.is_payment_expired(timeout, now),
            remaining_seconds: order.remaining_seconds(timeout, now),
        }),
    )))
}

#[utoipa::path(
    get,
    path = "/checkout/payment-info/{id}",
    tag = "Checkout",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status=200, description= "Bank transfer instructions", body= GenericResponse<PaymentInfoResponse>),
        (status=400, description= "Order is not paid by bank transfer", body= GenericResponse<TupleUnit>),
        (status=404, description= "Order not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Payment window expired or order no longer pending", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Payment Info API", skip(pool, user, sepay_client, sepay_settings), fields(user_id = %user.id))]
pub async fn payment_info_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    sepay_client: web::Data<SePayClient>,
    sepay_settings: web::Data<SePaySettings>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<PaymentInfoResponse>>, GenericError> {
    let timeout = sepay_settings.payment_timeout_minutes;
    let order = fetch_current_user_order(&pool, user.id, path.into_inner(), timeout).await?;
    if order.payment_method != PaymentMethod::Sepay {
        return Err(CheckoutError::InvalidRequest(
            "Order is not paid by bank transfer".to_string(),
        )
        .into());
    }
    match order.status {
        OrderStatus::Pending => {}
        OrderStatus::Cancelled => return Err(CheckoutError::PaymentExpired.into()),
        status => return Err(CheckoutError::InvalidState(status).into()),
    }
    let now = Utc::now();
    let payment = sepay_client.payment_info(
        &order.final_amount,
        &order.payment_code,
        order.payment_expire_at(timeout),
    );
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched payment info",
        Some(PaymentInfoResponse {
            order_id: order.id,
            remaining_seconds: order.remaining_seconds(timeout, now),
            final_amount: order.final_amount,
            payment,
        }),
    )))
}

#[utoipa::path(
    patch,
    path = "/checkout/change-payment-method/{id}",
    tag = "Checkout",
    params(("id" = Uuid, Path, description = "Order id"), ChangePaymentMethodQuery),
    responses(
        (status=200, description= "Payment method changed", body= GenericResponse<ChangePaymentMethodResponse>),
        (status=400, description= "Same method requested", body= GenericResponse<TupleUnit>),
        (status=404, description= "Order not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Order no longer pending", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Change Payment Method API", skip(pool, user, sepay_client, sepay_settings), fields(user_id = %user.id))]
pub async fn change_payment_method_req(
    path: web::Path<Uuid>,
    query: web::Query<ChangePaymentMethodQuery>,
    pool: web::Data<PgPool>,
    sepay_client: web::Data<SePayClient>,
    sepay_settings: web::Data<SePaySettings>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<ChangePaymentMethodResponse>>, GenericError> {
    let (order, payment) = change_payment_method(
        &pool,
        user.id,
        path.into_inner(),
        query.new_method,
        sepay_settings.payment_timeout_minutes,
    )
    .await?;
    let (payment_url, payment_content) = match order.payment_method {
        PaymentMethod::Sepay => {
            let content = SePayClient::payment_content(&order.payment_code);
            (
                Some(sepay_client.qr_url(&order.final_amount, &content)),
                Some(content),
            )
        }
        PaymentMethod::Cod => (None, None),
    };
    Ok(web::Json(GenericResponse::success(
        "Successfully changed payment method",
        Some(ChangePaymentMethodResponse {
            order_id: order.id,
            payment_method: order.payment_method,
            payment_id: payment.id,
            payment_url,
            payment_content,
        }),
    )))
}

#[utoipa::path(
    post,
    path = "/checkout/cancel-order/{id}",
    tag = "Checkout",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status=200, description= "Order cancelled", body= GenericResponse<TupleUnit>),
        (status=404, description= "Order not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Invalid state for this action", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Cancel Order API", skip(pool, user), fields(user_id = %user.id))]
pub async fn cancel_order_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    cancel_customer_order(&pool, user.id, path.into_inner()).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully cancelled order",
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/checkout/sepay-webhook",
    tag = "Checkout",
    request_body(content = SePayWebhookRequest, description = "SePay transfer notification"),
    params(("X-SePay-Signature" = Option<String>, Header, description = "Hex HMAC-SHA256 of the raw body")),
    responses(
        (status=200, description= "Outcome of the reconciliation", body= WebhookResponse),
        (status=401, description= "Signature check failed", body= WebhookResponse),
    )
)]
#[tracing::instrument(err, name = "SePay Webhook API", skip(req, body, pool, sepay_client, sepay_settings))]
pub async fn sepay_webhook_req(
    req: HttpRequest,
    body: web::Bytes,
    pool: web::Data<PgPool>,
    sepay_client: web::Data<SePayClient>,
    sepay_settings: web::Data<SePaySettings>,
) -> Result<HttpResponse, GenericError> {
    let signature = req
        .headers()
        .get(SEPAY_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    match sepay_client.verify_signature(&body, signature) {
        SignatureCheck::Valid | SignatureCheck::NotConfigured => {}
        check => {
            tracing::warn!("Rejected webhook with signature check {:?}", check);
            return Ok(HttpResponse::Unauthorized().json(WebhookResponse::rejected("Invalid signature")));
        }
    }

    let payload: SePayWebhookRequest = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Malformed webhook payload: {}", e);
            return Ok(HttpResponse::Ok().json(WebhookResponse::rejected("Invalid payload")));
        }
    };
    let outcome =
        reconcile_bank_transfer(&pool, &payload, sepay_settings.amount_tolerance).await?;
    tracing::info!(success = outcome.success, "{}", outcome.message);
    Ok(HttpResponse::Ok().json(outcome))
}
