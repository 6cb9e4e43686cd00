//! Member layout pane
//!
//! Shows the selected type as an indented tree, one row per member:
//!
//! ```text
//! +off  size  name[len] : type
//! ```
//!
//! Nested members are listed below their container with offsets relative to
//! the outermost type.

use super::utils::{clamp_scroll, pane_block, visible_height};
use crate::parser::types::TypeInfo;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Flatten `info`'s members into display rows.
pub(crate) fn layout_lines(info: &TypeInfo) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for member in &info.members {
        push_member(&mut lines, member, 0, 0);
    }
    lines
}

fn push_member(lines: &mut Vec<Line<'static>>, member: &TypeInfo, base: usize, depth: usize) {
    let offset = base + member.offset;
    let extent = member
        .array_len
        .map(|len| format!("[{len}]"))
        .unwrap_or_default();

    lines.push(Line::from(vec![
        Span::styled(
            format!("+{offset:<5} {:>5}  ", member.size),
            Style::default().fg(DEFAULT_THEME.offset),
        ),
        Span::raw("  ".repeat(depth)),
        Span::styled(
            format!("{}{extent}", member.decl_name),
            Style::default().fg(DEFAULT_THEME.member),
        ),
        Span::styled(" : ", Style::default().fg(DEFAULT_THEME.muted)),
        Span::styled(
            member.name.replace('.', "::"),
            Style::default().fg(DEFAULT_THEME.type_name),
        ),
    ]));

    // Array elements share one layout; show the first.
    for inner in &member.members {
        push_member(lines, inner, offset, depth + 1);
    }
}

pub fn render_layout_pane(
    frame: &mut Frame,
    area: Rect,
    info: Option<&TypeInfo>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let Some(info) = info else {
        let paragraph = Paragraph::new("(nothing selected)")
            .block(pane_block(" Layout ".to_string(), is_focused))
            .style(Style::default().fg(DEFAULT_THEME.muted));
        frame.render_widget(paragraph, area);
        return;
    };

    let mut title = format!(" {} : {} bytes ", info.name.replace('.', "::"), info.size);
    if let Some(underlying) = &info.underlying {
        title = format!(" {} : {underlying} ", info.name.replace('.', "::"));
    } else if let Some(align) = info.alignment {
        title = format!(" {} : {} bytes, alignas({align}) ", info.name.replace('.', "::"), info.size);
    }
    let block = pane_block(title, is_focused);

    let lines = layout_lines(info);
    if lines.is_empty() {
        let paragraph = Paragraph::new("(no data members)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.muted));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible = visible_height(area);
    clamp_scroll(scroll_offset, lines.len(), visible);
    let visible_lines: Vec<Line> = lines.into_iter().skip(*scroll_offset).take(visible).collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);
}
