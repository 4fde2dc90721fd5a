pub mod scroll_pane;

pub use scroll_pane::{ScrollPane, ScrollPaneIds};
