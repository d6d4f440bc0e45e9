use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;

pub struct TextArea {}

impl<'a> TextArea {
    pub fn with_content(title: &str, content: &str) -> tui_textarea::TextArea<'a> {
        let lines = content
            .split('\n')
            .map(|line| return line.to_string())
            .collect::<Vec<String>>();

        let mut textarea = tui_textarea::TextArea::new(lines);
        textarea.move_cursor(tui_textarea::CursorMove::Bottom);
        textarea.move_cursor(tui_textarea::CursorMove::End);
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .title(title.to_string())
                .padding(Padding::new(1, 1, 0, 0)),
        );

        return textarea;
    }

    pub fn text(textarea: &tui_textarea::TextArea<'a>) -> String {
        return textarea.lines().join("\n");
    }
}
