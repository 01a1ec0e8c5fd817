//! User-facing explanation of blocking errors
//!
//! Maps the backing service's error codes onto a title, a message and a
//! short list of remediation steps for the owner of the data set.

use super::types::AppError;
use serde::{Deserialize, Serialize};

/// Renderable description of a blocking error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub title: String,
    pub message: String,
    pub steps: Vec<String>,
}

impl ErrorNotice {
    pub fn from_app_error(err: &AppError) -> Self {
        let Some(service_code) = err.service_code() else {
            return Self {
                title: "Connection Error".to_string(),
                message: "Could not connect to the database. Please check your internet connection."
                    .to_string(),
                steps: Vec::new(),
            };
        };

        match service_code {
            "auth/api-key-not-valid" => Self {
                title: "Invalid API Key".to_string(),
                message: "The API key in the service configuration is not valid.".to_string(),
                steps: steps(&[
                    "Open the project settings of the backing service.",
                    "Find the registered web app.",
                    "Copy the configuration and update it in the deployment.",
                ]),
            },
            "auth/configuration-not-found" => Self {
                title: "Authentication Not Enabled".to_string(),
                message: "Anonymous authentication must be enabled for this app.".to_string(),
                steps: steps(&[
                    "Open the service console and select the project.",
                    "Navigate to the Authentication section.",
                    "Open the sign-in method tab.",
                    "Enable the Anonymous provider.",
                ]),
            },
            "permission-denied" => Self {
                title: "Database Permission Denied".to_string(),
                message: "The database security rules are blocking access to your own data."
                    .to_string(),
                steps: steps(&[
                    "Open the database section of the service console.",
                    "Open the Rules tab.",
                    "Allow signed-in users to read and write users/{uid}/**.",
                    "Publish the rules.",
                ]),
            },
            _ => Self {
                title: "An Unknown Error Occurred".to_string(),
                message: format!("An unexpected error occurred: {}", err.message),
                steps: Vec::new(),
            },
        }
    }
}

fn steps(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}
