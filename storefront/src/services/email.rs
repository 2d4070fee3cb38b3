// storefront/src/services/email.rs

//! Outgoing email: the sender seam, a logging implementation and the message templates.

use async_trait::async_trait;
use florist::{Order, OtpPurpose};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EmailMessage {
  pub to: String,
  pub subject: String,
  pub html_body: String,
}

#[derive(Debug)]
pub struct SentEmailInfo {
  pub message_id: String,
  pub body_preview: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
  async fn send(&self, message: &EmailMessage) -> anyhow::Result<SentEmailInfo>;
}

/// Logs messages instead of delivering them. Subjects containing `fail_test` fail.
pub struct LogEmailSender {
  from: String,
}

impl LogEmailSender {
  pub fn new(from: impl Into<String>) -> Self {
    Self { from: from.into() }
  }
}

#[async_trait]
impl EmailSender for LogEmailSender {
  #[instrument(name = "email::send", skip(self, message), fields(to = %message.to, subject = %message.subject))]
  async fn send(&self, message: &EmailMessage) -> anyhow::Result<SentEmailInfo> {
    info!(from = %self.from, "Simulating email delivery.");
    tokio::time::sleep(std::time::Duration::from_millis(20)).await; // Simulate network latency

    if message.subject.to_lowercase().contains("fail_test") {
      warn!("Simulated email failure.");
      anyhow::bail!("Simulated email send failure");
    }

    let body_preview = message.html_body.chars().take(50).collect::<String>() + "...";
    let message_id = format!("log_email_{}", Uuid::new_v4());
    info!(%message_id, "Email logged.");
    Ok(SentEmailInfo {
      message_id,
      body_preview,
    })
  }
}

/// Formats kuruş as Turkish lira, e.g. `1.099,90 TL`.
pub fn format_try(kurus: i64) -> String {
  let sign = if kurus < 0 { "-" } else { "" };
  let abs = kurus.unsigned_abs();
  let lira = (abs / 100).to_string();
  let mut grouped = String::with_capacity(lira.len() + lira.len() / 3);
  for (idx, ch) in lira.chars().enumerate() {
    if idx > 0 && (lira.len() - idx) % 3 == 0 {
      grouped.push('.');
    }
    grouped.push(ch);
  }
  format!("{}{},{:02} TL", sign, grouped, abs % 100)
}

fn status_label(order: &Order) -> &'static str {
  use florist::OrderStatus::*;
  match order.status {
    Pending => "Ödeme bekleniyor",
    Confirmed => "Onaylandı",
    Processing => "Hazırlanıyor",
    Shipped => "Yola çıktı",
    Delivered => "Teslim edildi",
    Cancelled => "İptal edildi",
    Refunded => "İade edildi",
    Failed => "Ödeme başarısız",
  }
}

pub fn otp_code_email(to: &str, code: &str, purpose: OtpPurpose) -> EmailMessage {
  let action = match purpose {
    OtpPurpose::Login => "giriş",
    OtpPurpose::Registration => "üyelik",
    OtpPurpose::PasswordReset => "şifre sıfırlama",
  };
  EmailMessage {
    to: to.to_string(),
    subject: format!("Doğrulama kodunuz: {}", code),
    html_body: format!(
      "<p>{} işleminiz için doğrulama kodunuz:</p><h2>{}</h2><p>Kod 10 dakika geçerlidir.</p>",
      action, code
    ),
  }
}

pub fn welcome_email(to: &str, name: &str) -> EmailMessage {
  EmailMessage {
    to: to.to_string(),
    subject: "Aramıza hoş geldiniz!".to_string(),
    html_body: format!("<p>Merhaba {},</p><p>Hesabınız oluşturuldu.</p>", name),
  }
}

pub fn order_confirmation_email(order: &Order, site_base_url: &str) -> EmailMessage {
  let lines: String = order
    .items
    .iter()
    .map(|item| format!("<li>{} x {} ({})</li>", item.quantity, item.name, format_try(item.unit_price)))
    .collect();
  EmailMessage {
    to: order.customer.email.clone(),
    subject: format!("Siparişiniz alındı (#{})", order.order_number),
    html_body: format!(
      "<p>Merhaba {},</p><p>#{} numaralı siparişiniz alındı. Durum: {}.</p><ul>{}</ul>\
       <p>Toplam: {}</p><p>Teslimat: {} {}</p><p><a href=\"{}/siparis-takip?no={}\">Siparişimi takip et</a></p>",
      order.customer.name,
      order.order_number,
      status_label(order),
      lines,
      format_try(order.totals.total),
      order.delivery.delivery_date,
      order.delivery.time_slot,
      site_base_url,
      order.order_number
    ),
  }
}

pub fn status_update_email(order: &Order) -> EmailMessage {
  EmailMessage {
    to: order.customer.email.clone(),
    subject: format!("Sipariş #{}: {}", order.order_number, status_label(order)),
    html_body: format!(
      "<p>Merhaba {},</p><p>#{} numaralı siparişinizin yeni durumu: <strong>{}</strong>.</p>",
      order.customer.name,
      order.order_number,
      status_label(order)
    ),
  }
}

pub fn cancellation_email(order: &Order, reason: Option<&str>) -> EmailMessage {
  EmailMessage {
    to: order.customer.email.clone(),
    subject: format!("Sipariş #{} iptal edildi", order.order_number),
    html_body: format!(
      "<p>Merhaba {},</p><p>#{} numaralı siparişiniz iptal edildi.</p><p>{}</p>",
      order.customer.name,
      order.order_number,
      reason.unwrap_or("")
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formats_kurus_as_lira() {
    assert_eq!(format_try(0), "0,00 TL");
    assert_eq!(format_try(4_990), "49,90 TL");
    assert_eq!(format_try(109_990), "1.099,90 TL");
    assert_eq!(format_try(123_456_789), "1.234.567,89 TL");
    assert_eq!(format_try(-500), "-5,00 TL");
  }

  #[actix_web::test]
  async fn log_sender_fails_on_marker_subject() {
    let sender = LogEmailSender::new("siparis@florist.local");
    let ok = EmailMessage {
      to: "ayse@example.com".to_string(),
      subject: "Merhaba".to_string(),
      html_body: "<p>Merhaba</p>".to_string(),
    };
    assert!(sender.send(&ok).await.is_ok());

    let failing = EmailMessage {
      subject: "FAIL_TEST".to_string(),
      ..ok
    };
    assert!(sender.send(&failing).await.is_err());
  }
}
