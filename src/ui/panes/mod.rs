//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`types`]: Every user type with its size
//! - [`layout`]: Member tree of the selected type with offsets and sizes
//! - [`shader`]: Generated HLSL for the selected type
//! - [`status`]: Status bar with keybindings and the current template
//! - `utils`: Border styling and scroll clamping shared by the panes
//!
//! Each pane module exports one `render_*` function; scroll offsets are owned
//! by [`App`](crate::ui::App) and clamped here.

mod utils;

pub mod layout;
pub mod shader;
pub mod status;
pub mod types;

// Re-export render functions for convenience
pub use layout::render_layout_pane;
pub use shader::render_shader_pane;
pub use status::render_status_bar;
pub use types::render_types_pane;
