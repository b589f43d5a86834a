//! Command implementations, one function per subcommand.
//!
//! Each command talks to SES through an [`EmailService`] and writes its
//! results line by line to an [`Output`].

use std::io::Write;

use anyhow::{bail, Context, Result};
use postman_ses::EmailService;
use postman_utils::{apply_transformers, build_transformers, Config, EmailMessage, SendConfig};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{error, info};

use crate::{
    cli::{Command, SendArgs},
    output::Output,
};

/// Runs `command` against `service`, `input` is only read by `send`.
pub async fn run<R, W>(
    command: Command,
    service: &dyn EmailService,
    config: &Config,
    input: R,
    output: &mut Output<W>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    match command {
        Command::Send(args) => cmd_send(service, &config.send, args, input, output).await,
        Command::Verify { email } => cmd_verify(service, &email, output).await,
        Command::ListVerified => cmd_list_verified(service, output).await,
        Command::ShowQuota => cmd_show_quota(service, output).await,
        Command::ShowStats => cmd_show_stats(service, output).await,
        Command::DeleteVerified { email } => cmd_delete_verified(service, &email, output).await,
    }
}

pub async fn cmd_send<R, W>(
    service: &dyn EmailService,
    config: &SendConfig,
    args: SendArgs,
    mut input: R,
    output: &mut Output<W>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    output.progress(&format!("Sending mail to: {}", args.destinations.join(", ")))?;

    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .await
        .context("Failed to read message from standard input")?;

    let source = args.from.or_else(|| config.from.clone());
    let mut message = EmailMessage::new(source, args.destinations, raw);

    let transformers = build_transformers(config, args.sanitize);
    apply_transformers(&transformers, &mut message).await;

    info!(
        subject = %message.subject(),
        source = message.source.as_deref().unwrap_or("<From header>"),
        size = message.raw().len(),
        modified = message.is_modified(),
        "Sending message"
    );

    let result = service
        .send_raw_email(message.raw(), message.source.as_deref(), &message.destinations)
        .await;
    match result {
        Ok(sent) if sent.is_accepted() => {
            info!(message_id = %sent.message_id, "Message accepted");
            output.progress("OK")?;
            Ok(())
        }
        Ok(_) => {
            output.progress("ERROR: no message id in the SES response")?;
            bail!("SES did not return a message id")
        }
        Err(e) => {
            error!(error = %e, "Failed to send message");
            output.progress(&format!("ERROR: {e}"))?;
            Err(e).context("Failed to send message")
        }
    }
}

pub async fn cmd_verify<W: Write>(
    service: &dyn EmailService,
    emails: &[String],
    output: &mut Output<W>,
) -> Result<()> {
    for email in emails {
        service
            .verify_email_address(email)
            .await
            .with_context(|| format!("Failed to verify {email}"))?;
        output.progress(&format!("Verification for {email} sent."))?;
    }
    Ok(())
}

pub async fn cmd_list_verified<W: Write>(
    service: &dyn EmailService,
    output: &mut Output<W>,
) -> Result<()> {
    let addresses = service
        .list_verified_email_addresses()
        .await
        .context("Failed to list verified addresses")?;

    if addresses.is_empty() {
        output.line("No addresses are verified on this account.")?;
        return Ok(());
    }

    for address in &addresses {
        output.line(address)?;
    }
    Ok(())
}

pub async fn cmd_show_quota<W: Write>(
    service: &dyn EmailService,
    output: &mut Output<W>,
) -> Result<()> {
    let quota = service
        .get_send_quota()
        .await
        .context("Failed to get send quota")?;
    output.line(&format!("Max 24 Hour Send: {}", quota.max_24_hour_send))?;
    output.line(&format!("Sent Last 24 Hours: {}", quota.sent_last_24_hours))?;
    output.line(&format!("Max Send Rate: {}", quota.max_send_rate))?;
    Ok(())
}

pub async fn cmd_show_stats<W: Write>(
    service: &dyn EmailService,
    output: &mut Output<W>,
) -> Result<()> {
    let points = service
        .get_send_statistics()
        .await
        .context("Failed to get send statistics")?;
    for point in &points {
        output.line(&format!("Complaints: {}", point.complaints))?;
        output.line(&format!("Timestamp: {}", point.timestamp))?;
        output.line(&format!("DeliveryAttempts: {}", point.delivery_attempts))?;
        output.line(&format!("Bounces: {}", point.bounces))?;
        output.line(&format!("Rejects: {}", point.rejects))?;
        output.line("")?;
    }
    Ok(())
}

pub async fn cmd_delete_verified<W: Write>(
    service: &dyn EmailService,
    emails: &[String],
    output: &mut Output<W>,
) -> Result<()> {
    for email in emails {
        service
            .delete_verified_email_address(email)
            .await
            .with_context(|| format!("Failed to delete {email}"))?;
        output.progress(&format!("Deleted {email}"))?;
    }
    Ok(())
}
