//! Domain model structs persisted in the JSON document store.
//!
//! Field names are camelCase on the wire and on disk so that documents
//! written by earlier versions of the service stay readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Order status
// ---------------------------------------------------------------------------

/// Lifecycle state of an order.
///
/// Serialized lowercase (`"pending"`, `"processing"`, ...). New states may be
/// added over time; callers should not assume the set is closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

// ---------------------------------------------------------------------------
// File reference
// ---------------------------------------------------------------------------

/// Client-facing descriptor of an uploaded document.
///
/// `path` points at the stored file (`/uploads/<stored-name>`); `name` keeps
/// the original filename for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRef {
    /// Original filename as submitted by the client.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Declared MIME type.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Public path of the stored file.
    pub path: String,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A customer print job.
///
/// Created once via [`crate::OrderRepository::append`]; afterwards only the
/// `status` field ever changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order identifier (`ORD-<millis>-<seq>`), generated server-side.
    pub order_id: String,
    pub full_name: String,
    pub phone_number: String,
    /// Kind of print job (e.g. `"document"`); drives which optional fields
    /// the client fills in.
    pub print_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding_color_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bw_pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    /// Uploaded documents, taken verbatim from prior upload responses.
    /// Not re-validated here; a bulk file clear may orphan these paths.
    #[serde(default)]
    pub files: Vec<FileRef>,
    /// Creation timestamp, set server-side.
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    /// Client-supplied quote; the server does not recompute it.
    pub total_cost: f64,
}

/// Client payload for creating an order: everything in [`Order`] minus the
/// server-generated fields.
///
/// Unknown keys are rejected so a client cannot smuggle `status` or
/// `orderId` into the stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewOrder {
    pub full_name: String,
    pub phone_number: String,
    pub print_type: String,
    #[serde(default)]
    pub binding_color_type: Option<String>,
    #[serde(default)]
    pub copies: Option<u32>,
    #[serde(default)]
    pub paper_size: Option<String>,
    #[serde(default)]
    pub print_side: Option<String>,
    #[serde(default)]
    pub selected_pages: Option<String>,
    #[serde(default)]
    pub color_pages: Option<String>,
    #[serde(default)]
    pub bw_pages: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub files: Vec<FileRef>,
    pub total_cost: f64,
}

// ---------------------------------------------------------------------------
// Admin credential
// ---------------------------------------------------------------------------

/// The admin login singleton, seeded on first boot.
///
/// The default credential is a development placeholder stored in plain text;
/// deployments must override it via configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminCredential {
    pub username: String,
    pub password: String,
}
