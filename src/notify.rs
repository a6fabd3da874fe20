//! Outbound notification side-channel for the checkout stub.
//!
//! There is no payment processor behind the configurator; a submit only
//! posts a formatted message to a webhook so a human can follow up. A
//! failed post is logged and never blocks the user-facing flow.

use serde_json::json;

/// What the configurator collected before the user hit submit.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub category_id: String,
    pub product_id: String,
    pub product_name: String,
    pub billing_mode: String,
    pub price: Option<f64>,
    pub customer_name: String,
    pub customer_email: String,
}

impl CheckoutRequest {
    fn format_message(&self) -> String {
        let price = self
            .price
            .map(|p| format!("${p:.2}/{}", self.billing_mode))
            .unwrap_or_else(|| "price unavailable".to_string());
        format!(
            "New configurator request: {} ({}/{}) at {} — {} <{}>",
            self.product_name,
            self.category_id,
            self.product_id,
            price,
            self.customer_name,
            self.customer_email,
        )
    }
}

#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(client: reqwest::Client, webhook_url: Option<String>) -> Self {
        Notifier { client, webhook_url }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Post the checkout message. Fire-and-forget from the caller's point
    /// of view: every failure ends here as a log line.
    pub async fn send_checkout_request(&self, request: &CheckoutRequest) {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("No notification webhook configured; dropping checkout message");
            return;
        };
        let body = json!({ "text": request.format_message() });
        match self.client.post(url).json(&body).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(status = %resp.status(), "Checkout notification rejected");
            }
            Ok(_) => {
                tracing::info!(product = %request.product_id, "Checkout notification sent");
            }
            Err(e) => {
                tracing::warn!(%e, "Checkout notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_includes_product_and_customer() {
        let req = CheckoutRequest {
            category_id: "vps".into(),
            product_id: "vps-2".into(),
            product_name: "VPS 2".into(),
            billing_mode: "monthly".into(),
            price: Some(12.5),
            customer_name: "Ada".into(),
            customer_email: "ada@example.com".into(),
        };
        let msg = req.format_message();
        assert!(msg.contains("VPS 2"));
        assert!(msg.contains("$12.50/monthly"));
        assert!(msg.contains("ada@example.com"));
    }

    #[test]
    fn missing_price_reads_as_unavailable() {
        let req = CheckoutRequest {
            category_id: "cdn".into(),
            product_id: "cdn-basic".into(),
            product_name: "CDN Basic".into(),
            billing_mode: "annual".into(),
            price: None,
            customer_name: "Ada".into(),
            customer_email: "ada@example.com".into(),
        };
        assert!(req.format_message().contains("price unavailable"));
    }
}
