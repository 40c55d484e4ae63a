use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Accepts the canonical names, their capitalised labels and the legacy
    /// `pending` alias.
    pub fn from_str(value: &str) -> Option<Self> {
        match normalize_status(value).as_str() {
            "open" => Some(TicketStatus::Open),
            "in_progress" | "pending" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    /// Comments are blocked while closed; the status itself can still be reopened.
    pub fn blocks_comments(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }

    /// Target of the detail view's single resolve/reopen toggle.
    pub fn toggled(&self) -> Self {
        match self {
            TicketStatus::Closed => TicketStatus::Open,
            _ => TicketStatus::Closed,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TicketStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TicketStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TicketStatus::from_str(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown ticket status '{raw}'")))
    }
}

/// Lowercases and folds runs of whitespace, `-` and `_` into a single `_`.
pub fn normalize_status(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut pending_separator = false;
    for ch in value.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
            continue;
        }
        if pending_separator && !result.is_empty() {
            result.push('_');
        }
        pending_separator = false;
        result.extend(ch.to_lowercase());
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TicketStatus),
}

impl StatusFilter {
    pub fn from_str(value: &str) -> Option<Self> {
        if normalize_status(value) == "all" {
            return Some(StatusFilter::All);
        }
        TicketStatus::from_str(value).map(StatusFilter::Only)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.as_str(),
        }
    }

    pub fn accepts(&self, status: TicketStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}
