//! View composition: element construction, mounting, and rendering.
//!
//! This module plays the role the DOM plays for a browser client. Screens
//! build small [`Element`] trees out of text, styled spans, line breaks, and
//! input fields, then mount them on a [`Page`]. The [`TerminalPage`]
//! implementation keeps the mounted elements and field contents, handles text
//! editing for the focused field, and renders everything as centered cards
//! with ratatui.
//!
//! Screens only talk to the [`Page`] trait; tests substitute a recording
//! implementation to observe mounts, unmounts, and visibility changes.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::theme::Theme;

// ── Element model ────────────────────────────────────────────────────────────

/// Style tag attached to panels and spans; the theme maps each tag to
/// terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleClass {
    FormInput,
    LoginBox,
    InstructionsBox,
    Subtext,
    GameTitle,
    ErrorText,
    /// The game viewport placeholder the entry screen hides and restores.
    Viewport,
}

/// Handle to a mounted element, valid until `unmount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub(crate) u64);

/// Handle to an input field created on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub(crate) usize);

/// One child of a panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain text in the default style.
    Text(String),
    /// Text with a style class of its own.
    Span { class: StyleClass, text: String },
    /// Forces the following children onto a new line.
    Break,
    /// An input field previously created with [`Page::create_field`].
    Field(FieldId),
}

/// A mountable panel: a style class plus child content.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub class: StyleClass,
    pub children: Vec<Node>,
}

impl Element {
    pub fn panel(class: StyleClass, children: Vec<Node>) -> Self {
        Self { class, children }
    }
}

// Free constructors so call sites read like markup.

pub fn text(s: impl Into<String>) -> Node {
    Node::Text(s.into())
}

pub fn span(class: StyleClass, s: impl Into<String>) -> Node {
    Node::Span {
        class,
        text: s.into(),
    }
}

pub fn br() -> Node {
    Node::Break
}

// ── Page trait ───────────────────────────────────────────────────────────────

/// Mounting and field access, the only surface screens depend on.
pub trait Page {
    /// Create an input field that can be embedded in an element via
    /// [`Node::Field`]. Fields live for the rest of the page's lifetime.
    fn create_field(&mut self, class: StyleClass, placeholder: &str) -> FieldId;

    /// Mount an element; it becomes visible immediately.
    fn mount(&mut self, element: Element) -> ElementId;

    /// Remove an element from the page. Unknown ids are ignored.
    fn unmount(&mut self, id: ElementId);

    /// Make a mounted element visible.
    fn show(&mut self, id: ElementId);

    /// Hide a mounted element without unmounting it.
    fn hide(&mut self, id: ElementId);

    /// Whether the element is mounted and visible.
    fn is_visible(&self, id: ElementId) -> bool;

    /// Give keyboard focus to a field; subsequent text editing targets it.
    fn focus(&mut self, id: FieldId);

    /// Current contents of a field. Unknown ids read as empty.
    fn field_value(&self, id: FieldId) -> String;
}

// ── Terminal implementation ──────────────────────────────────────────────────

struct FieldState {
    class: StyleClass,
    placeholder: String,
    value: String,
    cursor: usize,
}

struct Mounted {
    id: ElementId,
    element: Element,
    visible: bool,
}

/// The real page backing the terminal UI.
#[derive(Default)]
pub struct TerminalPage {
    fields: Vec<FieldState>,
    mounted: Vec<Mounted>,
    focus: Option<FieldId>,
    next_element_id: u64,
}

impl TerminalPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a key press to the focused field (insert, backspace, cursor
    /// movement). Keys that are not text editing, or arrive with no focused
    /// field, are ignored.
    pub fn edit(&mut self, key: KeyEvent) {
        let Some(FieldId(idx)) = self.focus else {
            return;
        };
        let Some(field) = self.fields.get_mut(idx) else {
            return;
        };
        match key.code {
            KeyCode::Char(c) => {
                field.value.insert(field.cursor, c);
                field.cursor += c.len_utf8();
            }
            KeyCode::Backspace => {
                if field.cursor > 0 {
                    let prev = field.value[..field.cursor]
                        .chars()
                        .next_back()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    field.cursor -= prev;
                    field.value.remove(field.cursor);
                }
            }
            KeyCode::Left => {
                if field.cursor > 0 {
                    let prev = field.value[..field.cursor]
                        .chars()
                        .next_back()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    field.cursor -= prev;
                }
            }
            KeyCode::Right => {
                if let Some(c) = field.value[field.cursor..].chars().next() {
                    field.cursor += c.len_utf8();
                }
            }
            _ => {}
        }
    }

    /// Render every visible mounted element as a centered card, stacked
    /// vertically in mount order.
    pub fn render(&self, f: &mut ratatui::Frame, theme: &Theme) {
        let area = f.area();
        let visible: Vec<&Mounted> = self.mounted.iter().filter(|m| m.visible).collect();

        let cards: Vec<(Vec<Line>, StyleClass)> = visible
            .iter()
            .map(|m| (self.lines_for(&m.element, theme), m.element.class))
            .collect();

        // Total stack height: each card is its lines plus a border, with a
        // one-row gap between cards.
        let total: u16 = cards
            .iter()
            .map(|(lines, _)| lines.len() as u16 + 2)
            .sum::<u16>()
            + cards.len().saturating_sub(1) as u16;
        let mut y = area.height.saturating_sub(total) / 2;

        for (lines, class) in cards {
            let height = lines.len() as u16 + 2;
            let width = lines
                .iter()
                .map(|l| l.width() as u16)
                .max()
                .unwrap_or(0)
                .max(40)
                + 4;
            let x = area.width.saturating_sub(width) / 2;
            let card = Rect::new(x, y, width.min(area.width), height.min(area.height));

            f.render_widget(Clear, card);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.class_color(class)));
            f.render_widget(block, card);

            let inner = Rect::new(
                card.x + 2,
                card.y + 1,
                card.width.saturating_sub(4),
                card.height.saturating_sub(2),
            );
            f.render_widget(
                Paragraph::new(lines).alignment(Alignment::Center),
                inner,
            );

            y = y.saturating_add(height + 1);
        }
    }

    /// Lay out an element's children as styled lines, breaking at `Break`.
    fn lines_for(&self, element: &Element, theme: &Theme) -> Vec<Line<'_>> {
        let mut lines = Vec::new();
        let mut current: Vec<Span> = Vec::new();
        for node in &element.children {
            match node {
                Node::Text(s) => {
                    current.push(Span::styled(
                        s.clone(),
                        Style::default().fg(theme.text),
                    ));
                }
                Node::Span { class, text } => {
                    let mut style = Style::default().fg(theme.class_color(*class));
                    if *class == StyleClass::GameTitle {
                        style = style.add_modifier(Modifier::BOLD);
                    }
                    current.push(Span::styled(text.clone(), style));
                }
                Node::Break => {
                    lines.push(Line::from(std::mem::take(&mut current)));
                }
                Node::Field(FieldId(idx)) => {
                    if let Some(field) = self.fields.get(*idx) {
                        if field.value.is_empty() {
                            current.push(Span::styled(
                                field.placeholder.clone(),
                                Style::default().fg(theme.field_placeholder),
                            ));
                        } else {
                            current.push(Span::styled(
                                field.value.clone(),
                                Style::default().fg(theme.class_color(field.class)),
                            ));
                        }
                        if self.focus == Some(FieldId(*idx)) {
                            current.push(Span::styled(
                                "_",
                                Style::default().fg(theme.text_dim),
                            ));
                        }
                    }
                }
            }
        }
        lines.push(Line::from(current));
        lines
    }
}

impl Page for TerminalPage {
    fn create_field(&mut self, class: StyleClass, placeholder: &str) -> FieldId {
        self.fields.push(FieldState {
            class,
            placeholder: placeholder.to_string(),
            value: String::new(),
            cursor: 0,
        });
        FieldId(self.fields.len() - 1)
    }

    fn mount(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.next_element_id);
        self.next_element_id += 1;
        self.mounted.push(Mounted {
            id,
            element,
            visible: true,
        });
        id
    }

    fn unmount(&mut self, id: ElementId) {
        self.mounted.retain(|m| m.id != id);
    }

    fn show(&mut self, id: ElementId) {
        if let Some(m) = self.mounted.iter_mut().find(|m| m.id == id) {
            m.visible = true;
        }
    }

    fn hide(&mut self, id: ElementId) {
        if let Some(m) = self.mounted.iter_mut().find(|m| m.id == id) {
            m.visible = false;
        }
    }

    fn is_visible(&self, id: ElementId) -> bool {
        self.mounted
            .iter()
            .find(|m| m.id == id)
            .is_some_and(|m| m.visible)
    }

    fn focus(&mut self, id: FieldId) {
        self.focus = Some(id);
    }

    fn field_value(&self, id: FieldId) -> String {
        self.fields
            .get(id.0)
            .map(|f| f.value.clone())
            .unwrap_or_default()
    }
}
