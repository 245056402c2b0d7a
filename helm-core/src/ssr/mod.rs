//! Server-Side Rendering
//!
//! Serializes a resolved head into HTML fragments: concatenated head tags,
//! body-open/body-close tags, and attribute strings for the root and body
//! elements. Attribute values and text content are escaped so unsanitized
//! entries cannot inject markup; script and style bodies neutralize
//! premature closing tags instead.
//!
//! [`transform_html_template`] rewrites a complete HTML document string in
//! place, preserving any markup not owned by a tracked tag.

mod escape;
mod render;
mod template;

pub use escape::{escape_attr, escape_text};
pub use render::{render_attrs, render_ssr_head, render_tag, SsrOutput, MARKER_ATTR};
pub use template::transform_html_template;
