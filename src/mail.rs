//! Outbound email.
//!
//! Messages go through a [`Mailer`] chosen by `EMAIL_BACKEND`: `console` logs
//! them, `memory` keeps them in an in-process outbox, and `http` posts them
//! as JSON to a transactional mail API.

use futures_util::future::BoxFuture;
use log::info;
use reqwest::Client;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::{AppConfig, EmailBackend};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from_email: String,
    pub to: Vec<String>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("{0} is required")]
    NotConfigured(&'static str),
    #[error("mail transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail api rejected message (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

pub trait Mailer: Send + Sync {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), MailError>>;
}

pub fn build_mailer(config: &AppConfig) -> Result<Arc<dyn Mailer>, MailError> {
    Ok(match config.email_backend {
        EmailBackend::Console => Arc::new(ConsoleMailer),
        EmailBackend::Memory => Arc::new(MemoryMailer::default()),
        EmailBackend::Http => Arc::new(HttpMailer::from_config(config)?),
    })
}

pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            info!(
                "email from={} to={} subject={:?}\n{}",
                message.from_email,
                message.to.join(","),
                message.subject,
                message.body
            );
            Ok(())
        })
    }
}

/// Keeps every sent message so callers can inspect what would have gone out.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    pub fn outbox(&self) -> Vec<EmailMessage> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.clear();
        }
    }
}

impl Mailer for MemoryMailer {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            if let Ok(mut outbox) = self.outbox.lock() {
                outbox.push(message.clone());
            }
            Ok(())
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailAddress {
    email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: MailAddress,
    to: Vec<MailAddress>,
    subject: String,
    text_content: String,
}

pub struct HttpMailer {
    client: Client,
    url: String,
    api_key: String,
}

impl HttpMailer {
    pub fn from_config(config: &AppConfig) -> Result<Self, MailError> {
        let url = config
            .mail_api_url
            .clone()
            .ok_or(MailError::NotConfigured("MAIL_API_URL"))?;
        let api_key = config
            .mail_api_key
            .clone()
            .ok_or(MailError::NotConfigured("MAIL_API_KEY"))?;
        Ok(Self {
            client: Client::new(),
            url,
            api_key,
        })
    }
}

impl Mailer for HttpMailer {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            let body = SendEmailBody {
                sender: MailAddress {
                    email: message.from_email.clone(),
                },
                to: message
                    .to
                    .iter()
                    .map(|email| MailAddress { email: email.clone() })
                    .collect(),
                subject: message.subject.clone(),
                text_content: message.body.clone(),
            };

            let resp = self
                .client
                .post(&self.url)
                .header("api-key", &self.api_key)
                .header("Accept", "application/json")
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if status.is_success() {
                return Ok(());
            }
            let body = resp.text().await.unwrap_or_default();
            Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            subject: "hello".to_string(),
            body: "body".to_string(),
            from_email: "webmaster@localhost".to_string(),
            to: vec!["bob@bob.com".to_string()],
        }
    }

    #[actix_rt::test]
    async fn memory_mailer_records_messages() {
        let mailer = MemoryMailer::default();
        mailer.send(&message()).await.unwrap();
        mailer.send(&message()).await.unwrap();
        assert_eq!(mailer.outbox().len(), 2);
        mailer.clear();
        assert!(mailer.outbox().is_empty());
    }

    #[test]
    fn http_payload_uses_api_field_names() {
        let msg = message();
        let body = SendEmailBody {
            sender: MailAddress { email: msg.from_email.clone() },
            to: vec![MailAddress { email: msg.to[0].clone() }],
            subject: msg.subject.clone(),
            text_content: msg.body.clone(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["sender"]["email"], "webmaster@localhost");
        assert_eq!(json["to"][0]["email"], "bob@bob.com");
        assert_eq!(json["textContent"], "body");
    }

    #[test]
    fn http_mailer_needs_url_and_key() {
        let config = AppConfig {
            email_backend: EmailBackend::Http,
            ..AppConfig::default()
        };
        assert!(matches!(
            build_mailer(&config),
            Err(MailError::NotConfigured("MAIL_API_URL"))
        ));
    }
}
