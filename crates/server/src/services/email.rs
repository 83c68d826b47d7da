//! Email service for OTP codes, order and contact notifications.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Every message
//! is sent as multipart/alternative with plain text and HTML bodies.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use real_taste_core::OrderStatus;

use crate::config::EmailConfig;
use crate::models::contact::NewContactMessage;
use crate::models::order::Order;

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "email/otp.html")]
struct OtpEmailHtml<'a> {
    code: &'a str,
    ttl_minutes: u64,
}

#[derive(Template)]
#[template(path = "email/otp.txt")]
struct OtpEmailText<'a> {
    code: &'a str,
    ttl_minutes: u64,
}

/// One order line, formatted for display.
struct LineView {
    name: String,
    quantity: i32,
    subtotal: String,
}

/// Order fields formatted for display.
struct OrderView {
    reference: String,
    lines: Vec<LineView>,
    total: String,
    payment_method: String,
    mobile_number: String,
    special_instructions: String,
    placed_at: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            reference: order.reference.clone(),
            lines: order
                .items
                .iter()
                .map(|item| LineView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    subtotal: u32::try_from(item.quantity)
                        .ok()
                        .and_then(|q| item.price.times(q).ok())
                        .map_or_else(|| item.price.to_string(), |p| p.to_string()),
                })
                .collect(),
            total: order.total_amount.to_string(),
            payment_method: order.payment_method.to_string(),
            mobile_number: order.mobile_number.to_string(),
            special_instructions: order.special_instructions.clone(),
            placed_at: order.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    customer_name: &'a str,
    order: &'a OrderView,
    preparation_time: i32,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    customer_name: &'a str,
    order: &'a OrderView,
    preparation_time: i32,
}

#[derive(Template)]
#[template(path = "email/order_admin_notification.html")]
struct OrderAdminHtml<'a> {
    customer_name: &'a str,
    customer_email: &'a str,
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/order_admin_notification.txt")]
struct OrderAdminText<'a> {
    customer_name: &'a str,
    customer_email: &'a str,
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/order_status_update.html")]
struct StatusUpdateHtml<'a> {
    customer_name: &'a str,
    reference: &'a str,
    status: OrderStatus,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_status_update.txt")]
struct StatusUpdateText<'a> {
    customer_name: &'a str,
    reference: &'a str,
    status: OrderStatus,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_admin.html")]
struct ContactAdminHtml<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_admin.txt")]
struct ContactAdminText<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_ack.html")]
struct ContactAckHtml<'a> {
    name: &'a str,
    subject: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_ack.txt")]
struct ContactAckText<'a> {
    name: &'a str,
    subject: &'a str,
}

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

// =============================================================================
// SMTP transport
// =============================================================================

/// SMTP sender for transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

// =============================================================================
// Mailer
// =============================================================================

/// Outgoing mail, either over SMTP or written to the log.
///
/// `Log` is used when SMTP is not configured (local development). It
/// renders every template exactly as `Smtp` would, so template errors show
/// up either way.
#[derive(Clone)]
pub enum Mailer {
    Smtp(EmailService),
    Log,
}

impl Mailer {
    /// Build a mailer from optional SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if SMTP is configured but the relay cannot be set up.
    pub fn from_config(config: Option<&EmailConfig>) -> Result<Self, SmtpError> {
        match config {
            Some(config) => Ok(Self::Smtp(EmailService::new(config)?)),
            None => Ok(Self::Log),
        }
    }

    /// Whether messages are actually delivered.
    #[must_use]
    pub const fn is_smtp(&self) -> bool {
        matches!(self, Self::Smtp(_))
    }

    /// Send a checkout verification code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_otp(&self, to: &str, code: &str, ttl_minutes: u64) -> Result<(), EmailError> {
        let html = OtpEmailHtml { code, ttl_minutes }.render()?;
        let text = OtpEmailText { code, ttl_minutes }.render()?;
        self.deliver(to, "Your Real Taste verification code", &text, &html)
            .await
    }

    /// Send the customer's order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        customer_name: &str,
        order: &Order,
        preparation_time: i32,
    ) -> Result<(), EmailError> {
        let view = OrderView::from(order);
        let html = OrderConfirmationHtml {
            customer_name,
            order: &view,
            preparation_time,
        }
        .render()?;
        let text = OrderConfirmationText {
            customer_name,
            order: &view,
            preparation_time,
        }
        .render()?;
        let subject = format!("Order {} confirmed", view.reference);
        self.deliver(to, &subject, &text, &html).await
    }

    /// Notify the shop of a new order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_admin_notification(
        &self,
        to: &str,
        customer_name: &str,
        customer_email: &str,
        order: &Order,
    ) -> Result<(), EmailError> {
        let view = OrderView::from(order);
        let html = OrderAdminHtml {
            customer_name,
            customer_email,
            order: &view,
        }
        .render()?;
        let text = OrderAdminText {
            customer_name,
            customer_email,
            order: &view,
        }
        .render()?;
        let subject = format!("New order {} ({})", view.reference, view.total);
        self.deliver(to, &subject, &text, &html).await
    }

    /// Tell the customer their order changed status.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_status_update(
        &self,
        to: &str,
        customer_name: &str,
        order: &Order,
    ) -> Result<(), EmailError> {
        let message = order.status.customer_message();
        let html = StatusUpdateHtml {
            customer_name,
            reference: &order.reference,
            status: order.status,
            message,
        }
        .render()?;
        let text = StatusUpdateText {
            customer_name,
            reference: &order.reference,
            status: order.status,
            message,
        }
        .render()?;
        let subject = format!("Order {}: {}", order.reference, order.status);
        self.deliver(to, &subject, &text, &html).await
    }

    /// Forward a contact form message to the shop.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_contact_admin(
        &self,
        to: &str,
        contact: &NewContactMessage,
    ) -> Result<(), EmailError> {
        let html = ContactAdminHtml {
            name: &contact.name,
            email: contact.email.as_str(),
            subject: &contact.subject,
            message: &contact.message,
        }
        .render()?;
        let text = ContactAdminText {
            name: &contact.name,
            email: contact.email.as_str(),
            subject: &contact.subject,
            message: &contact.message,
        }
        .render()?;
        let subject = format!("Contact form: {}", contact.subject);
        self.deliver(to, &subject, &text, &html).await
    }

    /// Acknowledge a contact form message to its sender.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_contact_ack(&self, contact: &NewContactMessage) -> Result<(), EmailError> {
        let html = ContactAckHtml {
            name: &contact.name,
            subject: &contact.subject,
        }
        .render()?;
        let text = ContactAckText {
            name: &contact.name,
            subject: &contact.subject,
        }
        .render()?;
        self.deliver(
            contact.email.as_str(),
            "We received your message",
            &text,
            &html,
        )
        .await
    }

    async fn deliver(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        match self {
            Self::Smtp(service) => {
                service
                    .send_multipart_email(to, subject, text_body, html_body)
                    .await
            }
            Self::Log => {
                tracing::info!(to = %to, subject = %subject, body = %text_body, "Email not sent (SMTP not configured)");
                Ok(())
            }
        }
    }
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use real_taste_core::{
        Email, MobileNumber, OrderId, OrderItemId, PaymentMethod, PaymentStatus, Price, ProductId,
        UserId,
    };
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::order::OrderItem;

    fn order() -> Order {
        Order {
            id: OrderId::new(42),
            reference: OrderId::new(42).reference(),
            user_id: UserId::new(1),
            customer: None,
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                product_id: Some(ProductId::new(3)),
                name: "Masala Chai".to_string(),
                quantity: 2,
                price: Price::new(Decimal::new(2500, 2)).unwrap(),
            }],
            total_amount: Price::new(Decimal::new(5000, 2)).unwrap(),
            status: OrderStatus::Ready,
            payment_status: PaymentStatus::Pending,
            payment_method: PaymentMethod::Cash,
            mobile_number: MobileNumber::parse("9876543210").unwrap(),
            special_instructions: "Extra ginger".to_string(),
            is_paid: false,
            paid_at: None,
            payment_result: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_verification_code_format() {
        let code = generate_verification_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_verification_code_range() {
        for _ in 0..100 {
            let code: u32 = generate_verification_code().parse().unwrap();
            assert!(code >= 100_000);
            assert!(code < 1_000_000);
        }
    }

    #[test]
    fn test_otp_templates_include_code() {
        let text = OtpEmailText {
            code: "123456",
            ttl_minutes: 5,
        }
        .render()
        .unwrap();
        assert!(text.contains("123456"));
        assert!(text.contains("5 minutes"));
    }

    #[test]
    fn test_order_view_formats_lines() {
        let view = OrderView::from(&order());
        assert_eq!(view.reference, "#000042");
        assert_eq!(view.lines[0].subtotal, "₹50.00");
        assert_eq!(view.total, "₹50.00");
    }

    #[test]
    fn test_admin_notification_mentions_details() {
        let view = OrderView::from(&order());
        let text = OrderAdminText {
            customer_name: "Asha",
            customer_email: "asha@example.com",
            order: &view,
        }
        .render()
        .unwrap();
        assert!(text.contains("9876543210"));
        assert!(text.contains("Cash"));
        assert!(text.contains("Extra ginger"));
    }

    #[test]
    fn test_contact_html_escapes_input() {
        let html = ContactAdminHtml {
            name: "<script>",
            email: "a@example.com",
            subject: "Hi",
            message: "x",
        }
        .render()
        .unwrap();
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_log_mailer_succeeds() {
        let mailer = Mailer::Log;
        assert!(!mailer.is_smtp());
        let contact = NewContactMessage {
            name: "Asha".to_string(),
            email: Email::parse("asha@example.com").unwrap(),
            subject: "Hello".to_string(),
            message: "Hi there".to_string(),
        };
        assert!(mailer.send_contact_ack(&contact).await.is_ok());
        assert!(mailer.send_order_status_update("asha@example.com", "Asha", &order()).await.is_ok());
    }
}
