use anyhow::{Result, anyhow};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

const SMTP_RELAY: &str = "smtp.gmail.com";
const FROM_ADDRESS: &str = "your-email@gmail.com";
const SUBJECT: &str = "Haztech SOS MESSAGE";

/// Outbound mail. With credentials configured this relays through Gmail;
/// without them it logs the message and reports success, so local runs
/// never need a mail account.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<SmtpTransport>,
}

impl Mailer {
    pub fn smtp(user: &str, key: &str) -> Result<Self> {
        let transport = SmtpTransport::relay(SMTP_RELAY)
            .map_err(|e| anyhow!("SMTP relay setup failed: {}", e))?
            .credentials(Credentials::new(user.to_string(), key.to_string()))
            .build();

        Ok(Self { transport: Some(transport) })
    }

    /// Log-only mailer for setups without SMTP credentials.
    pub fn disabled() -> Self {
        Self { transport: None }
    }

    pub async fn send(&self, to: &str, html: &str) -> Result<()> {
        let Some(transport) = self.transport.clone() else {
            info!(to = %to, "SMTP not configured; dropping email");
            return Ok(());
        };

        let email = Message::builder()
            .from(FROM_ADDRESS.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        // The sync transport blocks on the SMTP roundtrip.
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| anyhow!("Email task failed: {}", e))?
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

/// Branded notification template shared by sign-in alerts and OTP mail.
pub fn notification_email(recipient_name: &str, message: &str) -> String {
    format!(
        r##"
    <!DOCTYPE html>
    <html>
    <head>
        <title>WhatFlow Notification</title>
        <style>
            body {{
                font-family: Arial, sans-serif;
                margin: 0;
                padding: 0;
                background-color: #ffffff;
            }}
            .container {{
                width: 100%;
                max-width: 600px;
                margin: 0 auto;
                padding: 20px;
                background-color: #ffffff;
                border: 1px solid #ddd;
            }}
            .header {{
                background-color: #725c3a;
                padding: 10px;
                text-align: center;
                color: #ffffff;
            }}
            .content {{
                padding: 20px;
                color: #333333;
            }}
            .footer {{
                background-color: #725c3a;
                padding: 10px;
                text-align: center;
                color: #ffffff;
            }}
            .button {{
                background-color: #725c3a;
                color: #ffffff;
                padding: 10px 20px;
                text-decoration: none;
                display: inline-block;
                margin: 10px 0;
                border-radius: 5px;
            }}
        </style>
    </head>
    <body>
        <div class="container">
            <div class="header">
                <h1>Stubbly</h1>
            </div>
            <div class="content">
                <h2>Hello, {recipient_name}!</h2>
                <p>{message}</p>
                <a href="#" class="button">Learn More</a>
            </div>
            <div class="footer">
                <p>&copy; 2024 WhatFlow. All rights reserved.</p>
            </div>
        </div>
    </body>
    </html>
    "##
    )
}
