//! Pipeline stages for letter analysis.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the model backend can be swapped without touching
//! rendering or decoding.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ render ──▶ encode ──▶ compose ──▶ llm ──▶ decode
//!  (bytes)   (pages)    (base64)   (payload)   (text)  (JSON object)
//! ```
//!
//! 1. [`render`]:  decode images / rasterise PDF pages; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`encode`]:  PNG-encode and base64-wrap each page
//! 3. [`compose`]: instruction text followed by the page images
//! 4. [`llm`]:     the single outbound model call; the only stage with
//!    network I/O
//! 5. [`decode`]:  strip markdown fences, parse, optionally check the schema

pub mod compose;
pub mod decode;
pub mod encode;
pub mod llm;
pub mod render;
