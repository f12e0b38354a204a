//! Order creation and contact form submission.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiClient, ApiError, check},
    checkout::{OrderError, OrderGateway, OrderId, OrderPayload},
};

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(default, rename = "orderId")]
    order_id_camel: Option<RawOrderId>,

    #[serde(default)]
    order_id: Option<RawOrderId>,
}

/// The service has returned both numeric and string ids over time.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOrderId {
    Number(u64),
    Text(String),
}

impl RawOrderId {
    fn into_order_id(self) -> OrderId {
        match self {
            RawOrderId::Number(raw) => OrderId::new(raw.to_string()),
            RawOrderId::Text(raw) => OrderId::new(raw),
        }
    }
}

impl OrderResponse {
    fn into_order_id(self) -> Option<OrderId> {
        self.order_id_camel
            .or(self.order_id)
            .map(RawOrderId::into_order_id)
    }
}

#[async_trait]
impl OrderGateway for ApiClient {
    async fn submit(&self, payload: OrderPayload) -> Result<OrderId, OrderError> {
        let response = self
            .post_json("/orders", &payload)
            .await
            .map_err(OrderError::Transport)?;

        match check(response).await {
            Ok(response) => {
                let parsed: OrderResponse = response.json().await.map_err(ApiError::from)?;

                parsed.into_order_id().ok_or_else(|| {
                    OrderError::Transport(ApiError::UnexpectedResponse {
                        status: reqwest::StatusCode::OK,
                        message: "order response carried no order id".to_owned(),
                    })
                })
            }
            Err(ApiError::UnexpectedResponse { status, message })
                if status.is_client_error() =>
            {
                Err(OrderError::Rejected(message))
            }
            Err(err) => Err(OrderError::Transport(err)),
        }
    }
}

/// Contact form submission; fire-and-forget from the core's perspective.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    /// Sender name.
    pub name: String,

    /// Sender email.
    pub email: String,

    /// Sender phone; may be left empty.
    pub phone: String,

    /// Message subject.
    pub subject: String,

    /// Message body.
    pub message: String,
}

impl ApiClient {
    /// Submit a contact form message for the configured website.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn submit_contact(&self, contact: &ContactMessage) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "name": contact.name,
            "email": contact.email,
            "phone": contact.phone,
            "subject": contact.subject,
            "message": contact.message,
            "website_id": self.website_id(),
        });

        let response = self.post_json("/contact", &body).await?;
        check(response).await?;

        Ok(())
    }
}
