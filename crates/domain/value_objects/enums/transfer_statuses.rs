use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Processing => "processing",
            TransferStatus::Completed => "completed",
            TransferStatus::Failed => "failed",
        };
        write!(f, "{}", status)
    }
}

impl TransferStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "pending" => TransferStatus::Pending,
            "processing" => TransferStatus::Processing,
            "completed" => TransferStatus::Completed,
            _ => TransferStatus::Failed,
        }
    }
}
