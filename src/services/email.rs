/// Transactional email collaborator and the order confirmation message.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::render::render;
use crate::schema::context::Context;
use crate::services::order::Order;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEmail {
    pub id: String,
}

pub trait EmailSender {
    fn send(&mut self, to: &str, subject: &str, html: &str) -> Result<SentEmail, EmailError>;
}

/// Records messages instead of sending them.
#[derive(Debug, Default)]
pub struct Outbox {
    pub sent: Vec<(String, String, String)>,
}

impl EmailSender for Outbox {
    fn send(&mut self, to: &str, subject: &str, html: &str) -> Result<SentEmail, EmailError> {
        if to.trim().is_empty() {
            return Err(EmailError::Provider("missing recipient".to_string()));
        }
        self.sent
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(SentEmail {
            id: format!("outbox-{}", self.sent.len()),
        })
    }
}

const CONFIRMATION_SUBJECT: &str = "Your {equipment} rental is confirmed";
const CONFIRMATION_BODY: &str = "<p>Hi {customer_name},</p>\
<p>Thanks for your order #{order_id}. Your {equipment} rental for {rental_days} days \
comes to ${total}.</p>\
<p>Delivery to: {delivery_address}</p>";

/// Subject and HTML body for an order confirmation. The subject is
/// plain text; values are escaped only for the HTML body. Unknown
/// fields stay as visible tokens.
pub fn order_confirmation(order: &Order) -> (String, String) {
    let mut plain = Context::new()
        .with("customer_name", order.customer_name.as_str())
        .with("equipment", order.equipment.as_str())
        .with("rental_days", order.rental_days.to_string())
        .with(
            "total",
            format!("{}.{:02}", order.total_cents / 100, order.total_cents % 100),
        );
    if let Some(id) = order.id {
        plain.insert("order_id", id.0.to_string());
    }
    if let Some(ref address) = order.delivery_address {
        plain.insert("delivery_address", address.as_str());
    }

    let html: Context = plain.iter().map(|(k, v)| (k, escape_html(v))).collect();
    (render(CONFIRMATION_SUBJECT, &plain), render(CONFIRMATION_BODY, &html))
}

/// Send the confirmation for `order` to its customer.
pub fn send_order_confirmation<S: EmailSender>(
    sender: &mut S,
    order: &Order,
) -> Result<SentEmail, EmailError> {
    let (subject, html) = order_confirmation(order);
    sender.send(&order.customer_email, &subject, &html)
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
