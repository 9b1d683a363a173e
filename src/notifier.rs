use std::process::ExitStatus;

use tokio::process::Command;

use crate::config::NotificationSettings;
use crate::types::VaccineUpdate;

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Sends messages through `signal-cli`, or a compatible program.
#[derive(Debug, Clone)]
pub struct Notifier {
    program: String,
    sender: String,
    receiver: String,
    config_path: String,
    page_url: String,
}

impl Notifier {
    pub fn new(settings: &NotificationSettings, page_url: impl Into<String>) -> Self {
        Self {
            program: settings.command.clone(),
            sender: settings.sender.clone(),
            receiver: settings.receiver.clone(),
            config_path: settings.config_path.clone(),
            page_url: page_url.into(),
        }
    }

    pub fn message(&self, update: &VaccineUpdate) -> String {
        format!(
            "Vaccine booking: latest update {}, {} -> {}",
            update.date, update.criterion, self.page_url
        )
    }

    fn command(&self, message: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--verbose")
            .arg("--config")
            .arg(&self.config_path)
            .arg("--username")
            .arg(&self.sender)
            .arg("send")
            .arg("--message")
            .arg(message)
            .arg(&self.receiver);
        cmd
    }

    /// Runs the messaging program and logs how it exited. A non-zero exit is
    /// not an error value; the caller gets the status back.
    pub async fn notify(&self, update: &VaccineUpdate) -> Result<ExitStatus, NotifierError> {
        let message = self.message(update);
        let mut cmd = self.command(&message);
        log::debug!("Command: {:?}", cmd.as_std());

        let status = cmd.status().await.map_err(|source| NotifierError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if status.success() {
            log::info!("Notification sent to {}", self.receiver);
        } else {
            log::warn!(
                "{} exited with {}; notification to {} may not have been delivered",
                self.program,
                status,
                self.receiver
            );
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::ffi::OsStr;

    fn settings(command: &str) -> NotificationSettings {
        NotificationSettings {
            sender: "+440000000000".to_string(),
            receiver: "+441111111111".to_string(),
            config_path: "/project/signal config".to_string(),
            command: command.to_string(),
        }
    }

    fn sample_update() -> VaccineUpdate {
        VaccineUpdate::new(
            NaiveDate::from_ymd_opt(2024, 3, 19).unwrap(),
            "People aged 75 and over",
        )
    }

    #[test]
    fn test_message_format() {
        let notifier = Notifier::new(&settings("signal-cli"), crate::BOOKING_URL);

        assert_eq!(
            notifier.message(&sample_update()),
            format!(
                "Vaccine booking: latest update 2024-03-19, People aged 75 and over -> {}",
                crate::BOOKING_URL
            )
        );
    }

    #[test]
    fn test_command_argument_order() {
        let notifier = Notifier::new(&settings("signal-cli"), "https://example.org/");
        let message = notifier.message(&sample_update());
        let cmd = notifier.command(&message);

        assert_eq!(cmd.as_std().get_program(), OsStr::new("signal-cli"));
        let args: Vec<&OsStr> = cmd.as_std().get_args().collect();
        assert_eq!(
            args,
            [
                "--verbose",
                "--config",
                "/project/signal config",
                "--username",
                "+440000000000",
                "send",
                "--message",
                message.as_str(),
                "+441111111111",
            ]
            .map(OsStr::new)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_notify_reports_success() {
        let notifier = Notifier::new(&settings("true"), crate::BOOKING_URL);
        let status = notifier.notify(&sample_update()).await.unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_notify_returns_failed_status() {
        let notifier = Notifier::new(&settings("false"), crate::BOOKING_URL);
        let status = notifier.notify(&sample_update()).await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_notify_missing_program() {
        let notifier = Notifier::new(&settings("vaxwatch-no-such-program"), crate::BOOKING_URL);
        assert!(matches!(
            notifier.notify(&sample_update()).await,
            Err(NotifierError::Spawn { .. })
        ));
    }
}
