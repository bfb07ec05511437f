//! Control protocol
//!
//! Request/response messages consumed by UI collaborators (popup, options
//! page, CLI). Wire format is tagged JSON with camelCase names, matching
//! the persisted record layout.

use chaff_domain::{DispatchStats, Settings, SettingsPatch, Statistics};
use serde::{Deserialize, Serialize};

/// Engine status as reported by `getStatus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub is_active: bool,
    pub is_paused: bool,
    pub settings: Settings,
    pub statistics: Statistics,
    pub dispatch_stats: DispatchStats,
}

/// Inbound control request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ControlRequest {
    GetStatus,
    UpdateSettings(SettingsPatch),
    Toggle,
    Pause { paused: bool },
    GenerateNow,
}

/// Response to a control request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ControlResponse {
    Status(Box<StatusReport>),
    #[serde(rename_all = "camelCase")]
    Updated { success: bool },
    #[serde(rename_all = "camelCase")]
    Toggled { is_active: bool },
    #[serde(rename_all = "camelCase")]
    Paused { is_paused: bool },
    #[serde(rename_all = "camelCase")]
    Generated { success: bool },
}
