//! Taxoflow Core Types and Definitions
//!
//! This crate provides the data model shared by every stage of the taxoflow
//! diagram pipeline. It includes:
//!
//! - **Geometry**: Points and sizes ([`geometry`] module)
//! - **Colors**: CSS color handling for edge styles ([`color::Color`])
//! - **Localization**: Names, labels, descriptions and message resolution ([`localization`] module)
//! - **Tables**: Property tables attached to nodes ([`table`] module)
//! - **Trees**: The collapsible tree behind tree diagrams ([`tree::TreeNode`])
//! - **Diagrams**: Rendered node and edge records ([`diagram`] module)
//! - **Layout options**: ELK-style layout configuration ([`layout_options::LayoutOptions`])
//! - **Floating edges**: Border intersection geometry ([`floating`] module)

pub mod color;
pub mod diagram;
pub mod floating;
pub mod geometry;
pub mod layout_options;
pub mod localization;
pub mod table;
pub mod tree;
