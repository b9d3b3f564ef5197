//! # Image Reducer
//!
//! Shrinks images locally: pick a density, preview one image before and
//! after, then export every selected image re-encoded as lossy WebP (or
//! JPEG). Nothing leaves the machine.
//!
//! # Pipeline
//!
//! Every conversion, previewed or exported, runs the same three steps:
//!
//! ```text
//! bytes ──decode──▶ RGBA surface ──resize(density / baseline)──▶ surface ──encode──▶ bytes
//! ```
//!
//! Output dimensions are `round(original × density / baseline)` per side.
//! With the stock baseline of 72, a density of 36 halves an image and 144
//! doubles it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Entry point: one [`Session`] per reducer instance, with explicit create/dispose |
//! | [`registry`] | Ordered set of selected images with stable ids |
//! | [`imaging`] | Density math, decode/resize/encode backend over the `image` and `webp` crates |
//! | [`pipeline`] | The decode → scale → encode sequence, sync and async |
//! | [`preview`] | Single-image before/after comparison and selection rules |
//! | [`export`] | Parallel batch export with per-entry outcomes, progress events and cancellation |
//! | [`naming`] | `reduced-N.ext` export names and media-type inference |
//! | [`config`] | `reducer.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//! | [`error`] | [`ReduceError`], shared by every stage |
//!
//! # Design Decisions
//!
//! ## Failures Stay Per Image
//!
//! A corrupt file in a batch yields a failed outcome for that entry and
//! nothing else. Registration only checks the declared media type, so an
//! undecodable file is accepted and reported when it is converted.
//!
//! ## Positional Export Names
//!
//! Exports are named by registry position (`reduced-1.webp`, `reduced-2.webp`,
//! ...) rather than by source file name, and results come back in registry
//! order even though conversions finish in any order.
//!
//! ## No Global State
//!
//! All state lives in a [`Session`]. Two sessions in one process are fully
//! independent.

pub mod config;
pub mod error;
pub mod export;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod registry;
pub mod session;

pub use error::{ReduceError, Result};
pub use session::Session;
