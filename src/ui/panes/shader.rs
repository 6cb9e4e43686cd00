//! Generated shader pane with light HLSL highlighting

use super::utils::{clamp_scroll, pane_block, visible_height};
use crate::codegen::Template;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

fn word_style(word: &str) -> Style {
    match word {
        "struct" | "cbuffer" | "register" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "float" | "float2" | "float3" | "float4" | "float3x3" | "float4x4" | "int" | "uint"
        | "bool" | "double" => Style::default().fg(DEFAULT_THEME.type_name),
        _ if word.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.offset)
        }
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Split a line into words and punctuation, styling each word.
fn highlight_shader_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut word = String::new();

    for c in line.chars() {
        if c.is_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            let style = word_style(&word);
            spans.push(Span::styled(std::mem::take(&mut word), style));
        }
        let style = match c {
            '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.accent),
            _ => Style::default().fg(DEFAULT_THEME.fg),
        };
        spans.push(Span::styled(c.to_string(), style));
    }
    if !word.is_empty() {
        let style = word_style(&word);
        spans.push(Span::styled(word, style));
    }

    Line::from(spans)
}

/// `text` is `Err` with the codegen message when the type has no HLSL form.
pub fn render_shader_pane(
    frame: &mut Frame,
    area: Rect,
    text: Option<Result<&str, &str>>,
    template: Template,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let title = match template {
        Template::Struct => " HLSL struct ",
        Template::Cbuffer => " HLSL cbuffer ",
    };
    let block = pane_block(title.to_string(), is_focused);

    match text {
        None => {
            let paragraph = Paragraph::new("(nothing selected)")
                .block(block)
                .style(Style::default().fg(DEFAULT_THEME.muted));
            frame.render_widget(paragraph, area);
        }
        Some(Err(message)) => {
            let paragraph = Paragraph::new(message.to_string())
                .block(block)
                .style(Style::default().fg(DEFAULT_THEME.error))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
        Some(Ok(source)) => {
            let lines: Vec<&str> = source.lines().collect();
            let visible = visible_height(area);
            clamp_scroll(scroll_offset, lines.len(), visible);

            let visible_lines: Vec<Line> = lines
                .iter()
                .skip(*scroll_offset)
                .take(visible)
                .map(|line| highlight_shader_line(line))
                .collect();
            frame.render_widget(Paragraph::new(visible_lines).block(block), area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_keeps_text() {
        let line = highlight_shader_line("cbuffer Frame : register(b0)");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "cbuffer Frame : register(b0)");
        assert_eq!(line.spans[0].style, word_style("cbuffer"));
    }
}
