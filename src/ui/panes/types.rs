//! Type list pane

use super::utils::{clamp_scroll, pane_block, visible_height};
use crate::ui::app::InspectedType;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

/// Render the list of user types; the selection is kept in view.
pub fn render_types_pane(
    frame: &mut Frame,
    area: Rect,
    types: &[InspectedType],
    selected: usize,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(format!(" Types ({}) ", types.len()), is_focused);

    if types.is_empty() {
        let paragraph = Paragraph::new("(no types)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.muted));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible = visible_height(area);
    if selected < *scroll_offset {
        *scroll_offset = selected;
    } else if selected >= *scroll_offset + visible {
        *scroll_offset = selected + 1 - visible;
    }
    clamp_scroll(scroll_offset, types.len(), visible);

    let items: Vec<ListItem> = types
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible)
        .map(|(index, ty)| {
            let kind = if ty.info.underlying.is_some() { "enum " } else { "" };
            let mut line = Line::from(vec![
                Span::styled(kind, Style::default().fg(DEFAULT_THEME.keyword)),
                Span::styled(
                    ty.info.name.replace('.', "::"),
                    Style::default().fg(DEFAULT_THEME.type_name),
                ),
                Span::styled(
                    format!("  {}B", ty.info.size),
                    Style::default().fg(DEFAULT_THEME.offset),
                ),
            ]);
            if index == selected {
                line = line.style(
                    Style::default()
                        .bg(DEFAULT_THEME.selection_bg)
                        .add_modifier(Modifier::BOLD),
                );
            }
            ListItem::new(line)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
