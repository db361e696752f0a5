//! Orders and direct debit payments.
//!
//! A successful debit is recorded as a local session donation so it shows up
//! in the donation list before the DSO's history catches up.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use donor_portal_core::{Amount, DonationId, DonationStatus, DonationType};

use crate::cache::Resource;
use crate::dso::{DebitRequest, OrderRequest};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Donation, DonationSource};
use crate::normalize::fields::{first_text, unwrap_record};
use crate::session::SessionStorage;
use crate::state::AppState;

use super::{require_session, require_token, throttle_key};

/// Where a payment response may carry the new payment's id.
const PAYMENT_ID: &[&str] = &["id", "orderId", "transactionId", "paymentId"];

/// Payment service.
pub struct PaymentService<'a> {
    state: &'a AppState,
}

impl<'a> PaymentService<'a> {
    /// Create a new payment service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create an order for a donation or sponsorship.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a zero amount or missing product,
    /// `AppError::Unauthorized` without a session, and `AppError::Dso` if the
    /// DSO rejects the order.
    #[instrument(skip(self, storage, order), fields(product_id = %order.product_id))]
    pub async fn generate_order(&self, storage: &dyn SessionStorage, order: &OrderRequest) -> Result<Value> {
        if order.product_id.trim().is_empty() {
            return Err(AppError::BadRequest("Product is required".to_string()));
        }
        require_positive(order.amount)?;

        let session = require_session(self.state, storage).await?;
        if session.is_mock {
            return Err(AppError::BadRequest(
                "Orders are not available in mock mode".to_string(),
            ));
        }

        let result = self
            .state
            .dso()
            .generate_order(require_token(&session)?, order)
            .await?;

        let amount = order.amount.to_string();
        add_breadcrumb(
            "payments",
            "Generated order",
            Some(&[("product_id", order.product_id.as_str()), ("amount", amount.as_str())]),
        );
        Ok(result)
    }

    /// Charge a direct debit and record it as a local donation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a zero amount, `AppError::Unauthorized`
    /// without a session, and `AppError::Dso` if the DSO rejects the payment.
    #[instrument(skip(self, storage, payment), fields(amount = %payment.amount))]
    pub async fn debit(&self, storage: &dyn SessionStorage, payment: &DebitRequest) -> Result<Donation> {
        require_positive(payment.amount)?;

        let session = require_session(self.state, storage).await?;
        let response = if session.is_mock {
            Value::Null
        } else {
            self.state
                .dso()
                .payment_debit(require_token(&session)?, payment)
                .await?
        };

        let donation = local_donation(payment, &response);
        info!(donation_id = %donation.id, "Debit payment accepted");

        let sessions = self.state.sessions();
        sessions.record_local_donation(storage, donation.clone()).await;
        self.state
            .cache()
            .invalidate(Resource::Donations, &session.user.id)
            .await;
        self.state
            .throttle()
            .reset(&throttle_key(Resource::Donations, &session.user.id));

        let amount = payment.amount.to_string();
        add_breadcrumb("payments", "Debit payment", Some(&[("amount", amount.as_str())]));
        Ok(donation)
    }
}

fn require_positive(amount: Amount) -> Result<()> {
    if amount == Amount::ZERO {
        return Err(AppError::BadRequest("Amount must be positive".to_string()));
    }
    Ok(())
}

/// Build the local record of an accepted debit.
fn local_donation(payment: &DebitRequest, response: &Value) -> Donation {
    let record = unwrap_record(response);

    let id = record
        .and_then(|r| first_text(r, PAYMENT_ID))
        .unwrap_or_else(|| format!("{}-{}", DonationSource::Local.id_prefix(), Uuid::new_v4()));

    let status = record
        .and_then(|r| first_text(r, &["status", "paymentStatus"]))
        .map_or(DonationStatus::Pending, |s| DonationStatus::from_loose(&s));

    let description = payment
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| default_description(payment.kind).to_string());

    Donation {
        id: DonationId::new(id),
        date: Some(Utc::now()),
        amount: payment.amount,
        kind: payment.kind,
        status,
        description,
        source: DonationSource::Local,
    }
}

const fn default_description(kind: DonationType) -> &'static str {
    match kind {
        DonationType::Monthly => "Doação mensal",
        DonationType::Once => "Doação única",
        DonationType::Sponsorship => "Apadrinhamento",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payment() -> DebitRequest {
        DebitRequest {
            amount: Amount::from_cents(5000),
            kind: DonationType::Monthly,
            order_id: None,
            child_id: None,
            description: None,
        }
    }

    #[test]
    fn test_local_donation_takes_id_and_status_from_response() {
        let donation = local_donation(
            &payment(),
            &json!({ "data": { "transactionId": "T-9", "status": "aprovado" } }),
        );
        assert_eq!(donation.id.as_str(), "T-9");
        assert_eq!(donation.status, DonationStatus::Paid);
        assert_eq!(donation.source, DonationSource::Local);
        assert_eq!(donation.description, "Doação mensal");
        assert!(donation.date.is_some());
    }

    #[test]
    fn test_local_donation_without_response_id() {
        let donation = local_donation(&payment(), &Value::Null);
        assert!(donation.id.as_str().starts_with("local-"));
        assert_eq!(donation.status, DonationStatus::Pending);
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive(Amount::from_cents(1)).is_ok());
        assert!(require_positive(Amount::ZERO).is_err());
    }
}
