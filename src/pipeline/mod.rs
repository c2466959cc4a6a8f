//! Pipeline stages for magazine generation.
//!
//! Each submodule implements one step and is testable on its own; only
//! [`extract`] touches pdfium and only [`article`] talks to the network
//! (besides URL inputs in [`input`]).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──────────────▶ inject ──▶ fill ──▶ write
//!  (URL/path)  (pdfium: text, layout        ▲    (docx splice)
//!              tables, images)              │
//!                                   article (LLM + image)
//! ```
//!
//! 1. [`input`]    canonicalise paths or URLs, check magic bytes
//! 2. [`extract`]  bucket each PDF's lines, tables and images by heading,
//!    with [`layout`] finding tables, [`classify`] routing them and
//!    [`rows`] structuring flattened rows
//! 3. [`article`]  topic + body via the LLM, cleaned by [`postprocess`],
//!    plus the illustration
//! 4. [`fill`]     walk the template and splice content through [`docx`],
//!    merging tables with [`merge`]

pub mod article;
pub mod classify;
pub mod docx;
pub mod extract;
pub mod fill;
pub mod input;
pub mod layout;
pub mod merge;
pub mod postprocess;
pub mod rows;
