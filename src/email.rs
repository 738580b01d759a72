use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, Address, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use std::env::var;

struct Smtp {
    creds: Credentials,
    address: Address,
}

lazy_static::lazy_static! {
    // Email is optional: without credentials the server still runs and the
    // notification side effects are skipped.
    static ref SMTP: Option<Smtp> = {
        match (var("EMAIL_USERNAME"), var("EMAIL_PASSWORD")) {
            (Ok(username), Ok(password)) => match username.parse::<Address>() {
                Ok(address) => Some(Smtp {
                    creds: Credentials::new(username, password),
                    address,
                }),
                Err(_) => None,
            },
            _ => None,
        }
    };
}

pub fn is_configured() -> bool {
    SMTP.is_some()
}

pub async fn send(to_name: &str, to_address: &str, subject: &str, body: String) -> anyhow::Result<()> {
    let Some(smtp) = SMTP.as_ref() else {
        anyhow::bail!("email credentials are not configured");
    };

    let destination = to_address.parse::<Address>()?;
    let email = Message::builder()
        .from(Mailbox::new(
            Some("XClubs".to_string()),
            smtp.address.clone(),
        ))
        .to(Mailbox::new(Some(to_name.to_string()), destination))
        .subject(subject)
        .body(body)?;

    let mailer: AsyncSmtpTransport<Tokio1Executor> =
        AsyncSmtpTransport::<Tokio1Executor>::relay("smtp.gmail.com")?
            .credentials(smtp.creds.clone())
            .build();

    mailer.send(email).await?;
    Ok(())
}
