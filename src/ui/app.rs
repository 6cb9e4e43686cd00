//! Main TUI application state and logic

use crate::codegen::{self, Template, VertexFormat};
use crate::parser::types::TypeInfo;
use crate::parser::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Types,
    Layout,
    Shader,
}

impl FocusedPane {
    /// Move focus to the next pane (left to right)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Types => FocusedPane::Layout,
            FocusedPane::Layout => FocusedPane::Shader,
            FocusedPane::Shader => FocusedPane::Types,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Types => FocusedPane::Shader,
            FocusedPane::Layout => FocusedPane::Types,
            FocusedPane::Shader => FocusedPane::Layout,
        }
    }
}

/// One user type with everything the panes show for it.
///
/// Generated text is computed up front so that codegen warnings are logged
/// before the terminal switches to the alternate screen.
#[derive(Debug, Clone)]
pub struct InspectedType {
    pub info: TypeInfo,
    pub struct_text: Result<String, String>,
    pub cbuffer_text: Result<String, String>,
    pub format: VertexFormat,
}

impl InspectedType {
    pub fn new(info: &TypeInfo, register: u32) -> Self {
        InspectedType {
            info: info.clone(),
            struct_text: codegen::generate_struct(info).map_err(|e| e.to_string()),
            cbuffer_text: codegen::generate_cbuffer(info, register).map_err(|e| e.to_string()),
            format: codegen::vertex_format(info),
        }
    }

    pub fn shader_text(&self, template: Template) -> Result<&str, &str> {
        let text = match template {
            Template::Struct => &self.struct_text,
            Template::Cbuffer => &self.cbuffer_text,
        };
        text.as_deref().map_err(String::as_str)
    }
}

/// The main application state
pub struct App {
    pub types: Vec<InspectedType>,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Index into `types`
    pub selected: usize,

    /// Per-pane scroll offsets
    pub types_scroll: usize,
    pub layout_scroll: usize,
    pub shader_scroll: usize,

    pub template: Template,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Collect every user type the parser laid out. Cbuffers are numbered
    /// from `first_register` over aggregates only, matching
    /// [`codegen::generate_module`].
    pub fn new(parser: &Parser, first_register: u32) -> Self {
        let mut register = first_register;
        let types: Vec<_> = parser
            .type_infos()
            .user_types()
            .map(|info| {
                let inspected = InspectedType::new(info, register);
                if codegen::is_aggregate(info) {
                    register += 1;
                }
                inspected
            })
            .collect();

        let status_message = if types.is_empty() {
            String::from("No types declared")
        } else {
            format!("{} types", types.len())
        };

        App {
            types,
            focused_pane: FocusedPane::Types,
            selected: 0,
            types_scroll: 0,
            layout_scroll: 0,
            shader_scroll: 0,
            template: Template::Struct,
            should_quit: false,
            status_message,
        }
    }

    pub fn selected_type(&self) -> Option<&InspectedType> {
        self.types.get(self.selected)
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes on top, status bar at the bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(40),
                Constraint::Percentage(35),
            ])
            .split(main_chunks[0]);

        super::panes::render_types_pane(
            frame,
            columns[0],
            &self.types,
            self.selected,
            self.focused_pane == FocusedPane::Types,
            &mut self.types_scroll,
        );

        let selected = self.types.get(self.selected);

        super::panes::render_layout_pane(
            frame,
            columns[1],
            selected.map(|t| &t.info),
            self.focused_pane == FocusedPane::Layout,
            &mut self.layout_scroll,
        );

        super::panes::render_shader_pane(
            frame,
            columns[2],
            selected.map(|t| t.shader_text(self.template)),
            self.template,
            self.focused_pane == FocusedPane::Shader,
            &mut self.shader_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            selected.map(|t| t.format),
            self.template,
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.template = self.template.toggled();
                self.shader_scroll = 0;
                self.status_message = match self.template {
                    Template::Struct => "Showing struct template".to_string(),
                    Template::Cbuffer => "Showing cbuffer template".to_string(),
                };
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Types => self.select(self.selected.saturating_sub(1)),
                FocusedPane::Layout => self.layout_scroll = self.layout_scroll.saturating_sub(1),
                FocusedPane::Shader => self.shader_scroll = self.shader_scroll.saturating_sub(1),
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Types => self.select(self.selected.saturating_add(1)),
                FocusedPane::Layout => self.layout_scroll = self.layout_scroll.saturating_add(1),
                FocusedPane::Shader => self.shader_scroll = self.shader_scroll.saturating_add(1),
            },
            KeyCode::Home => self.select(0),
            KeyCode::End => self.select(self.types.len().saturating_sub(1)),
            _ => {}
        }
    }

    /// Select a type, resetting the detail panes' scroll.
    fn select(&mut self, index: usize) {
        if self.types.is_empty() {
            return;
        }
        let index = index.min(self.types.len() - 1);
        if index != self.selected {
            self.selected = index;
            self.layout_scroll = 0;
            self.shader_scroll = 0;
        }
        if let Some(selected) = self.types.get(index) {
            self.status_message = format!(
                "{} ({} bytes)",
                selected.info.name.replace('.', "::"),
                selected.info.size
            );
        }
    }
}
