// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-facing load milestones

use serde::{Deserialize, Serialize};

/// Display style of a notification
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A milestone reported by the load controller
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Notification {
    /// Processing of a payload has started
    Started { display_name: String },
    /// The model was attached to the scene
    Succeeded {
        display_name: String,
        size_bytes: Option<u64>,
    },
    /// The load failed; `reason` is human readable
    Failed { reason: String },
}

impl Notification {
    pub fn severity(&self) -> Severity {
        match self {
            Notification::Started { .. } => Severity::Info,
            Notification::Succeeded { .. } => Severity::Success,
            Notification::Failed { .. } => Severity::Error,
        }
    }

    /// Text shown to the user
    pub fn message(&self) -> String {
        match self {
            Notification::Started { display_name } => {
                format!("{} en cours de traitement, veuillez patienter...", display_name)
            }
            Notification::Succeeded {
                display_name,
                size_bytes: Some(size),
            } => format!(
                "{} ({}) chargé avec succès",
                display_name,
                format_megabytes(*size)
            ),
            Notification::Succeeded {
                display_name,
                size_bytes: None,
            } => format!("{} chargé avec succès", display_name),
            Notification::Failed { reason } => format!("Échec du chargement : {}", reason),
        }
    }
}

/// Format a byte count as decimal megabytes (`2.00 Mo`)
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} Mo", bytes as f64 / 1_000_000.0)
}

/// Receiver of load milestones (toast, snackbar, log...)
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

/// Collecting sink, handy for headless use
impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(2_000_000), "2.00 Mo");
        assert_eq!(format_megabytes(1_234_567), "1.23 Mo");
        assert_eq!(format_megabytes(0), "0.00 Mo");
    }

    #[test]
    fn test_success_message_mentions_name_and_size() {
        let n = Notification::Succeeded {
            display_name: "model.ifc".to_string(),
            size_bytes: Some(2_000_000),
        };
        assert_eq!(n.message(), "model.ifc (2.00 Mo) chargé avec succès");
        assert_eq!(n.severity(), Severity::Success);
    }

    #[test]
    fn test_success_message_without_size() {
        let n = Notification::Succeeded {
            display_name: "model.ifc".to_string(),
            size_bytes: None,
        };
        assert_eq!(n.message(), "model.ifc chargé avec succès");
    }

    #[test]
    fn test_started_and_failed_messages() {
        let started = Notification::Started {
            display_name: "tower.ifc".to_string(),
        };
        assert!(started.message().starts_with("tower.ifc en cours de traitement"));

        let failed = Notification::Failed {
            reason: "Invalid IFC format: missing DATA section".to_string(),
        };
        assert!(failed.message().contains("missing DATA section"));
        assert_eq!(failed.severity(), Severity::Error);
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Notification> = Vec::new();
        sink.notify(Notification::Failed {
            reason: "x".to_string(),
        });
        assert_eq!(sink.len(), 1);
    }
}
