//! # Default Vim keymaps
//!
//! Motions are bound to `cursor.move` with the motion's name in the `motion` argument, both in
//! Normal and Visual modes and in Operator-Pending mode, where they complete an operator.
//! Operators (`d`, `c`, `y`, `>`, `<`) are bound in the `operator` category so that the input
//! handler waits for a motion or text object before producing them. Repeating an operator's key
//! in Operator-Pending mode applies it to the current line, as in `dd`.
use super::{Binding, Keymap, KeymapSource, OPERATOR_CATEGORY};
use crate::action::names::{MODE_POP, MODE_SWITCH};

const MOTIONS: &[(&str, &str, &str)] = &[
    ("h", "left", "Move left"),
    ("<Left>", "left", "Move left"),
    ("<BS>", "left", "Move left"),
    ("j", "down", "Move down"),
    ("<Down>", "down", "Move down"),
    ("k", "up", "Move up"),
    ("<Up>", "up", "Move up"),
    ("l", "right", "Move right"),
    ("<Right>", "right", "Move right"),
    ("<Space>", "right", "Move right"),
    ("w", "word_forward", "Next word"),
    ("W", "bigword_forward", "Next WORD"),
    ("b", "word_backward", "Previous word"),
    ("B", "bigword_backward", "Previous WORD"),
    ("e", "word_end", "End of word"),
    ("E", "bigword_end", "End of WORD"),
    ("0", "line_start", "Start of line"),
    ("<Home>", "line_start", "Start of line"),
    ("^", "first_non_blank", "First non-blank character"),
    ("$", "line_end", "End of line"),
    ("<End>", "line_end", "End of line"),
    ("g g", "buffer_start", "First line"),
    ("G", "buffer_end", "Last line"),
    ("g e", "word_end_backward", "End of previous word"),
    ("g _", "last_non_blank", "Last non-blank character"),
    ("{", "paragraph_backward", "Previous paragraph"),
    ("}", "paragraph_forward", "Next paragraph"),
    ("%", "matching_bracket", "Matching bracket"),
    ("H", "screen_top", "Top of screen"),
    ("M", "screen_middle", "Middle of screen"),
    ("L", "screen_bottom", "Bottom of screen"),
];

const TEXT_OBJECTS: &[(&str, &str)] = &[
    ("w", "word"),
    ("W", "bigword"),
    ("s", "sentence"),
    ("p", "paragraph"),
    ("(", "parens"),
    (")", "parens"),
    ("b", "parens"),
    ("{", "braces"),
    ("}", "braces"),
    ("B", "braces"),
    ("[", "brackets"),
    ("]", "brackets"),
    ("<lt>", "angles"),
    (">", "angles"),
    ("\"", "double_quotes"),
    ("'", "single_quotes"),
    ("`", "backticks"),
];

const OPERATORS: &[(&str, &str, &str)] = &[
    ("d", "delete", "Delete"),
    ("c", "change", "Change"),
    ("y", "yank", "Yank"),
    (">", "indent", "Indent"),
    ("<lt>", "dedent", "Dedent"),
    ("g u", "lowercase", "Make lowercase"),
    ("g U", "uppercase", "Make uppercase"),
];

fn motions(keymap: Keymap) -> Keymap {
    MOTIONS.iter().fold(keymap, |km, (keys, motion, desc)| {
        km.binding(
            Binding::new(*keys, "cursor.move")
                .arg("motion", *motion)
                .description(*desc)
                .category("motion"),
        )
    })
}

fn switch(keys: &str, mode: &str, desc: &str) -> Binding {
    Binding::new(keys, MODE_SWITCH).arg("mode", mode).description(desc)
}

fn normal() -> Keymap {
    let keymap = Keymap::new("vim-normal").mode("normal").source(KeymapSource::Default);
    let keymap = motions(keymap);

    let keymap = OPERATORS.iter().fold(keymap, |km, (keys, action, desc)| {
        km.binding(Binding::new(*keys, *action).description(*desc).category(OPERATOR_CATEGORY))
    });

    keymap
        .binding(switch("i", "insert", "Insert before the cursor"))
        .binding(switch("a", "insert", "Insert after the cursor").arg("position", "after"))
        .binding(switch("I", "insert", "Insert at line start").arg("position", "line_start"))
        .binding(switch("A", "insert", "Insert at line end").arg("position", "line_end"))
        .binding(switch("o", "insert", "Open line below").arg("position", "open_below"))
        .binding(switch("O", "insert", "Open line above").arg("position", "open_above"))
        .binding(switch("R", "replace", "Replace characters"))
        .binding(switch("v", "visual", "Visual mode"))
        .binding(switch("V", "visual_line", "Visual line mode"))
        .binding(switch("<C-v>", "visual_block", "Visual block mode"))
        .binding(switch(":", "command", "Command line"))
        .binding(Binding::new("x", "delete").arg("motion", "right").description("Delete character"))
        .binding(Binding::new("X", "delete").arg("motion", "left").description("Delete previous character"))
        .binding(Binding::new("D", "delete").arg("motion", "line_end").description("Delete to line end"))
        .binding(Binding::new("C", "change").arg("motion", "line_end").description("Change to line end"))
        .binding(Binding::new("Y", "yank").arg("motion", "line").description("Yank line"))
        .binding(Binding::new("p", "paste").arg("position", "after").description("Paste after"))
        .binding(Binding::new("P", "paste").arg("position", "before").description("Paste before"))
        .binding(Binding::new("u", "history.undo").description("Undo"))
        .binding(Binding::new("<C-r>", "history.redo").description("Redo"))
        .binding(Binding::new(".", "repeat").description("Repeat last change"))
        .binding(Binding::new("n", "search.next").description("Next match"))
        .binding(Binding::new("N", "search.previous").description("Previous match"))
        .binding(Binding::new("<C-w> j", "window.focus").arg("direction", "down"))
        .binding(Binding::new("<C-w> k", "window.focus").arg("direction", "up"))
        .binding(Binding::new("<C-w> h", "window.focus").arg("direction", "left"))
        .binding(Binding::new("<C-w> l", "window.focus").arg("direction", "right"))
        .binding(Binding::new("<C-w> s", "window.split").arg("axis", "horizontal"))
        .binding(Binding::new("<C-w> v", "window.split").arg("axis", "vertical"))
        .binding(Binding::new("<C-w> q", "window.close"))
        .binding(Binding::new("Z Z", "file.save_and_quit").description("Save and quit"))
        .binding(Binding::new("Z Q", "quit").arg("force", true).description("Quit without saving"))
}

fn operator_pending() -> Keymap {
    let keymap = Keymap::new("vim-operator-pending")
        .mode("operator_pending")
        .source(KeymapSource::Default);
    let keymap = motions(keymap);

    let keymap = TEXT_OBJECTS.iter().fold(keymap, |km, (suffix, object)| {
        km.binding(
            Binding::new(format!("i {suffix}"), "text_object")
                .arg("textObject", format!("inner_{object}"))
                .category("text_object"),
        )
        .binding(
            Binding::new(format!("a {suffix}"), "text_object")
                .arg("textObject", format!("around_{object}"))
                .category("text_object"),
        )
    });

    OPERATORS.iter().fold(keymap, |km, (keys, _, _)| {
        // The last key of the operator applies it linewise, so `dd` and `gUU` both work.
        let last = keys.rsplit(' ').next().unwrap_or(*keys);

        km.binding(Binding::new(last, "cursor.move").arg("motion", "line").category("motion"))
    })
    .binding(Binding::new("<Esc>", MODE_POP).description("Cancel operator"))
}

fn visual(name: &str, mode: &str) -> Keymap {
    let keymap = Keymap::new(name).mode(mode).source(KeymapSource::Default);
    let keymap = motions(keymap);

    let keymap = TEXT_OBJECTS.iter().fold(keymap, |km, (suffix, object)| {
        km.binding(
            Binding::new(format!("i {suffix}"), "selection.expand")
                .arg("textObject", format!("inner_{object}")),
        )
        .binding(
            Binding::new(format!("a {suffix}"), "selection.expand")
                .arg("textObject", format!("around_{object}")),
        )
    });

    keymap
        .binding(Binding::new("d", "delete").arg("target", "selection"))
        .binding(Binding::new("x", "delete").arg("target", "selection"))
        .binding(Binding::new("c", "change").arg("target", "selection"))
        .binding(Binding::new("y", "yank").arg("target", "selection"))
        .binding(Binding::new(">", "indent").arg("target", "selection"))
        .binding(Binding::new("<lt>", "dedent").arg("target", "selection"))
        .binding(Binding::new("o", "selection.swap_anchor").description("Other end of selection"))
        .binding(switch("<Esc>", "normal", "Leave visual mode"))
        .binding(switch(":", "command", "Command line").arg("range", "selection"))
}

fn insert() -> Keymap {
    Keymap::new("vim-insert")
        .mode("insert")
        .source(KeymapSource::Default)
        .binding(switch("<Esc>", "normal", "Leave insert mode"))
        .binding(switch("<C-c>", "normal", "Leave insert mode"))
        .binding(Binding::new("<BS>", "delete").arg("motion", "left"))
        .binding(Binding::new("<Del>", "delete").arg("motion", "right"))
        .binding(Binding::new("<C-w>", "delete").arg("motion", "word_backward"))
        .binding(Binding::new("<C-u>", "delete").arg("motion", "line_start"))
        .binding(Binding::new("<C-r>", "paste").arg("position", "before"))
        .binding(Binding::new("<Left>", "cursor.move").arg("motion", "left"))
        .binding(Binding::new("<Right>", "cursor.move").arg("motion", "right"))
        .binding(Binding::new("<Up>", "cursor.move").arg("motion", "up"))
        .binding(Binding::new("<Down>", "cursor.move").arg("motion", "down"))
}

fn command() -> Keymap {
    Keymap::new("vim-command")
        .mode("command")
        .source(KeymapSource::Default)
        .binding(Binding::new("<C-u>", "command_line.clear"))
        .binding(Binding::new("<Up>", "command_line.history").arg("direction", "previous"))
        .binding(Binding::new("<Down>", "command_line.history").arg("direction", "next"))
        .binding(Binding::new("<Tab>", "command_line.complete"))
}

/// The keymaps for Vim's modes.
pub fn default_keymaps() -> Vec<Keymap> {
    vec![
        normal(),
        operator_pending(),
        visual("vim-visual", "visual"),
        visual("vim-visual-line", "visual_line"),
        visual("vim-visual-block", "visual_block"),
        insert(),
        command(),
    ]
}
