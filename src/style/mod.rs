pub mod properties;

pub use properties::{Align, Justify, LayoutType, Obstruction, Padding, Size, WantedBounds};
