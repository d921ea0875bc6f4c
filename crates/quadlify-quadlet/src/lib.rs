//! # quadlify-quadlet
//!
//! The quadlet side of the conversion: the target model and its
//! `quadlet-nix` rendering.
//!
//! Handles:
//! - **Text**: target strings as literal and variable segments.
//! - **Model**: containers, networks, and the variable table of one project.
//! - **Render**: a NixOS module setting `virtualisation.quadlet`.

pub mod model;
pub mod render;
pub mod text;

pub use model::{QuadletContainer, QuadletNetwork, QuadletProject, VariableTable};
pub use render::render_nix;
pub use text::{Segment, Text};
