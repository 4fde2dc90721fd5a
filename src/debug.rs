use std::fmt::Write;

use crate::layout::{ContainerId, Tree};

#[macro_export]
macro_rules! dbg_ev {
    ($ev:expr) => {{
        use $crate::windowing::EventKind;
        match $ev {
            EventKind::PointerDown { .. } => "PointerDown",
            EventKind::PointerUp { .. } => "PointerUp",
            EventKind::PointerMove { .. } => "PointerMove",
            EventKind::PointerEnter { .. } => "PointerEnter",
            EventKind::PointerLeave { .. } => "PointerLeave",
            EventKind::KeyDown(..) => "KeyDown",
            EventKind::KeyUp(..) => "KeyUp",
            EventKind::FocusIn => "FocusIn",
            EventKind::FocusOut => "FocusOut",
            EventKind::Expose => "Expose",
            EventKind::Configure { .. } => "Configure",
            EventKind::CloseRequested => "CloseRequested",
        }
    }};
}

/// One line per container, indented by depth, with its resolved bounds.
pub fn dump_tree(tree: &Tree) -> String {
    let mut out = String::new();
    dump(tree, tree.root(), 0, &mut out);
    out
}

fn dump(tree: &Tree, id: ContainerId, depth: usize, out: &mut String) {
    let Some(c) = tree.get(id) else {
        return;
    };
    let r = c.real;
    let _ = writeln!(
        out,
        "{:indent$}{} [{} {} {}x{}]{}",
        "",
        c.name.as_deref().unwrap_or("?"),
        r.origin.x,
        r.origin.y,
        r.size.x,
        r.size.y,
        if c.exists { "" } else { " hidden" },
        indent = depth * 2,
    );
    for &child in c.children() {
        dump(tree, child, depth + 1, out);
    }
}
