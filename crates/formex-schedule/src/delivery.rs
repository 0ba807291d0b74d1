//! Delivery seam for finished scheduled exports.

use tracing::info;

use formex_model::CloudTarget;

use crate::error::Result;

/// Outbound channels for a completed artifact. Implementations own the
/// transport details; the manager only ever calls these best-effort.
pub trait Delivery: Send + Sync {
    fn send_email_with_attachment(
        &self,
        recipients: &[String],
        subject: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<()>;

    fn upload_to_cloud(&self, target: &CloudTarget, file_name: &str, bytes: &[u8]) -> Result<()>;
}

/// Logs what would be delivered and succeeds. Default for environments
/// without outbound transport configured.
#[derive(Debug, Default)]
pub struct NoopDelivery;

impl Delivery for NoopDelivery {
    fn send_email_with_attachment(
        &self,
        recipients: &[String],
        subject: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<()> {
        info!(
            recipients = recipients.len(),
            subject,
            file_name,
            size = bytes.len(),
            "email delivery skipped (no transport configured)"
        );
        Ok(())
    }

    fn upload_to_cloud(&self, target: &CloudTarget, file_name: &str, bytes: &[u8]) -> Result<()> {
        info!(
            provider = %target.provider,
            folder = ?target.folder,
            file_name,
            size = bytes.len(),
            "cloud upload skipped (no transport configured)"
        );
        Ok(())
    }
}
