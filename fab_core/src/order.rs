//! # Order Data Structures
//!
//! The `Order` struct is the root container for one fabrication job: the
//! installation-site header, the workflow status, and the panel line items
//! with their attached cut sheets. Orders serialize to `.sfo` files as
//! human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Order
//! ├── meta: OrderMetadata (version, site, dates, timestamps)
//! ├── status: OrderStatus (pending / completed / cancelled)
//! └── items: Vec<LineItem> (panel spec + colors + cut sheet)
//! ```
//!
//! Items live in a `Vec` because worksheet row order is part of the output;
//! each still carries a UUID so single rows can be edited or removed.
//!
//! Every item's `cuts` field is derived from its `spec` at insert/update
//! time, so a loaded order never carries a sheet that disagrees with its
//! dimensions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FabError, FabResult};
use crate::formula::{compute, CutSheet, PanelCategory, PanelSpec};

/// Current schema version for .sfo files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root order container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order metadata (version, site, dates)
    pub meta: OrderMetadata,

    /// Workflow status
    pub status: OrderStatus,

    /// Panel line items, in worksheet order
    pub items: Vec<LineItem>,
}

impl Order {
    /// Create a new empty order.
    ///
    /// # Arguments
    ///
    /// * `site_name` - Customer or installation-site name
    /// * `start_date` - When the job was taken
    /// * `due_date` - Agreed delivery date, if any
    ///
    /// # Example
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use fab_core::order::{Order, OrderStatus};
    ///
    /// let order = Order::new("Riverside Apartments", NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(), None);
    /// assert_eq!(order.status, OrderStatus::Pending);
    /// assert_eq!(order.item_count(), 0);
    /// ```
    pub fn new(
        site_name: impl Into<String>,
        start_date: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Order {
            meta: OrderMetadata {
                version: SCHEMA_VERSION.to_string(),
                site_name: site_name.into(),
                start_date,
                due_date,
                created: now,
                modified: now,
            },
            status: OrderStatus::Pending,
            items: Vec::new(),
        }
    }

    /// Add a panel to the order. Computes the cut sheet and appends the line
    /// item; returns the UUID assigned to it.
    pub fn add_item(
        &mut self,
        spec: PanelSpec,
        frame_color: impl Into<String>,
        mesh_color: impl Into<String>,
    ) -> Uuid {
        let item = LineItem::new(spec, frame_color, mesh_color);
        let id = item.id;
        self.items.push(item);
        self.touch();
        id
    }

    /// Get a line item by UUID.
    pub fn item(&self, id: &Uuid) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Replace a line item's panel spec, recomputing its cut sheet.
    pub fn update_item_spec(&mut self, id: &Uuid, spec: PanelSpec) -> FabResult<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == *id)
            .ok_or_else(|| FabError::item_not_found(id.to_string()))?;
        item.spec = spec;
        item.cuts = compute(&spec);
        self.touch();
        Ok(())
    }

    /// Remove a line item by UUID. Returns the removed item if it existed.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<LineItem> {
        let index = self.items.iter().position(|item| item.id == *id)?;
        let item = self.items.remove(index);
        self.touch();
        Some(item)
    }

    /// Change the workflow status.
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.touch();
    }

    /// Rename the installation site.
    pub fn rename(&mut self, site_name: impl Into<String>) {
        self.meta.site_name = site_name.into();
        self.touch();
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of door panels in the order.
    pub fn door_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.spec.category == PanelCategory::Door)
            .count()
    }

    /// Number of window panels in the order.
    pub fn window_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.spec.category == PanelCategory::Window)
            .count()
    }
}

/// Order metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Customer or installation-site name
    pub site_name: String,

    /// When the job was taken
    pub start_date: NaiveDate,

    /// Agreed delivery date, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// When the order was created
    pub created: DateTime<Utc>,

    /// When the order was last modified
    pub modified: DateTime<Utc>,
}

/// Order workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = FabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(FabError::unknown_status(other)),
        }
    }
}

/// One panel on the order, with its derived cut sheet attached.
///
/// `frame_color` and `mesh_color` are fabric/finish attributes the engine
/// never reads; they ride along for the worksheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Stable id for targeted edit/remove
    pub id: Uuid,

    /// Panel specification as entered
    pub spec: PanelSpec,

    /// Frame finish color
    pub frame_color: String,

    /// Mesh fabric color
    pub mesh_color: String,

    /// Derived measurements; always `compute(&spec)`
    pub cuts: CutSheet,
}

impl LineItem {
    pub fn new(
        spec: PanelSpec,
        frame_color: impl Into<String>,
        mesh_color: impl Into<String>,
    ) -> Self {
        LineItem {
            id: Uuid::new_v4(),
            spec,
            frame_color: frame_color.into(),
            mesh_color: mesh_color.into(),
            cuts: compute(&spec),
        }
    }
}
