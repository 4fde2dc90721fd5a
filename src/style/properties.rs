/// Wanted extent of a container along one axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Size {
    Fixed(f32),
    /// Consume whatever the siblings leave on this axis.
    Fill,
    /// Shrink to the natural extent of the children.
    Content,
}

impl Default for Size {
    fn default() -> Self {
        Size::Fill
    }
}

impl From<f32> for Size {
    fn from(px: f32) -> Self {
        Size::Fixed(px)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum LayoutType {
    #[default]
    Vertical,
    Horizontal,
    ScrollPane,
    Free,
}

/// Cross-axis placement of children that don't fill.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

/// Main-axis placement of a stack when no child fills.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
}

/// Who may receive input while something else is on top of them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Obstruction {
    #[default]
    None,
    Full,
    /// Only when the single container in front is a direct child.
    ByOne,
}

#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Padding {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Padding {
    pub fn all(v: f32) -> Self {
        Self {
            left: v,
            right: v,
            top: v,
            bottom: v,
        }
    }

    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self {
            left: horizontal,
            right: horizontal,
            top: vertical,
            bottom: vertical,
        }
    }

    pub fn horizontal(self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(self) -> f32 {
        self.top + self.bottom
    }
}

/// Wanted geometry; `x`/`y` only matter to free layout.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct WantedBounds {
    pub x: f32,
    pub y: f32,
    pub w: Size,
    pub h: Size,
}

