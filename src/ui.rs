use crate::app::App;
use crate::store::GameRecord;
use crate::timer::format_hms;
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::Paragraph,
};

pub const ID_WIDTH: u16 = 5;
pub const NAME_WIDTH: u16 = 30;
pub const VERSION_WIDTH: u16 = 10;
pub const PATH_WIDTH: u16 = 40;
pub const FIRST_PLAYED_WIDTH: u16 = 13;
pub const LAST_PLAYED_WIDTH: u16 = 13;
pub const LAST_SESSION_WIDTH: u16 = 16;
pub const TOTAL_WIDTH: u16 = 16;

pub const COLUMN_WIDTHS: [u16; 8] = [
    ID_WIDTH,
    NAME_WIDTH,
    VERSION_WIDTH,
    PATH_WIDTH,
    FIRST_PLAYED_WIDTH,
    LAST_PLAYED_WIDTH,
    LAST_SESSION_WIDTH,
    TOTAL_WIDTH,
];

const PATH_COLUMN: usize = 3;
const SEPARATOR: &str = "| ";
const KEY_HINT: &str = "KeyInput >> q[uit], enter(play), j(down), k(up), g/G(top/bottom)";

/// One line of the game table, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub cells: Vec<String>,
    pub highlighted: bool,
}

/// Start column of each cell, the running sum of the widths before it.
pub fn column_offsets() -> [u16; 8] {
    let mut offsets = [0; 8];
    for i in 1..offsets.len() {
        offsets[i] = offsets[i - 1] + COLUMN_WIDTHS[i - 1];
    }
    offsets
}

/// Lay out the header and records as fixed-width cells. Row 0 is the header;
/// record `selected` is flagged for highlighting.
pub fn table_grid(header: &[String], records: &[GameRecord], selected: usize) -> Vec<GridRow> {
    let mut grid = Vec::with_capacity(records.len() + 1);

    let header_cells = (0..COLUMN_WIDTHS.len())
        .map(|i| header.get(i).cloned().unwrap_or_default())
        .collect();
    grid.push(GridRow {
        cells: with_separators(header_cells),
        highlighted: false,
    });

    for (i, record) in records.iter().enumerate() {
        let cells = vec![
            record.id.clone(),
            record.name.clone(),
            record.version.clone(),
            elide_path(&record.launch_path),
            record.first_played.clone(),
            record.last_played.clone(),
            record.last_session_seconds.map(format_hms).unwrap_or_default(),
            record.total_seconds.map(format_hms).unwrap_or_default(),
        ];
        grid.push(GridRow {
            cells: with_separators(cells),
            highlighted: i == selected,
        });
    }

    grid
}

fn with_separators(cells: Vec<String>) -> Vec<String> {
    cells
        .into_iter()
        .enumerate()
        .map(|(i, cell)| {
            if i == 0 {
                cell
            } else {
                format!("{}{}", SEPARATOR, cell)
            }
        })
        .collect()
}

/// Shorten a long path to `...` plus its tail so the file name stays visible.
pub fn elide_path(path: &str) -> String {
    let width = PATH_WIDTH as usize;
    let len = path.chars().count();
    if len <= width {
        return path.to_string();
    }
    let keep = width - 6;
    let tail: String = path.chars().skip(len - keep).collect();
    format!("...{}", tail)
}

/// First record to show so the selected one stays on screen.
pub fn scroll_offset(selected: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 {
        0
    } else {
        selected.saturating_sub(visible_rows - 1)
    }
}

/// Cut a cell down to `width` columns. A clipped path keeps its tail.
fn fit_cell(column: usize, text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if column == PATH_COLUMN && width > SEPARATOR.len() + 3 {
        let body = text.strip_prefix(SEPARATOR).unwrap_or(text);
        let keep = width - SEPARATOR.len() - 3;
        let skip = body.chars().count().saturating_sub(keep);
        let tail: String = body.chars().skip(skip).collect();
        return format!("{}...{}", SEPARATOR, tail);
    }
    text.chars().take(width).collect()
}

/// Write the header and the visible records at their fixed column offsets,
/// clipped at the right edge of `area`.
fn draw_grid(buf: &mut Buffer, area: Rect, grid: &[GridRow], offset: usize) {
    if area.height == 0 {
        return;
    }
    let offsets = column_offsets();
    let visible = area.height as usize - 1;
    let lines = grid
        .iter()
        .take(1)
        .chain(grid.iter().skip(1 + offset).take(visible));

    for (line, row) in lines.enumerate() {
        let y = area.y + line as u16;
        let style = if line == 0 {
            Style::default().add_modifier(Modifier::BOLD)
        } else if row.highlighted {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };

        for (i, cell) in row.cells.iter().enumerate() {
            let x = area.x.saturating_add(offsets[i]);
            if x >= area.right() {
                break;
            }
            let width = COLUMN_WIDTHS[i].min(area.right() - x) as usize;
            buf.set_stringn(x, y, fit_cell(i, cell, width), width, style);
        }
    }
}

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Key hint
            Constraint::Length(1), // Rule
            Constraint::Min(1),    // Game table
            Constraint::Length(1), // Status line
        ])
        .split(f.area());

    f.render_widget(Paragraph::new(KEY_HINT), chunks[0]);
    f.render_widget(
        Paragraph::new("=".repeat(chunks[1].width as usize)),
        chunks[1],
    );

    let table_area = chunks[2];
    let grid = table_grid(app.header(), app.records(), app.selected());
    let offset = scroll_offset(app.selected(), table_area.height.saturating_sub(1) as usize);
    draw_grid(f.buffer_mut(), table_area, &grid, offset);

    let status_text = match app.message() {
        Some(message) => format!(
            "{} games | {} | {}",
            app.records().len(),
            message,
            app.store_path().display()
        ),
        None => format!(
            "{} games | {}",
            app.records().len(),
            app.store_path().display()
        ),
    };
    let status = Paragraph::new(status_text).style(Style::default().fg(Color::Gray));
    f.render_widget(status, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crate::launch::ProcessLauncher;
    use crate::store::{DEFAULT_HEADER, RecordStore, STORE_FILE};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};
    use tempfile::TempDir;

    const STEAM_PATH: &str =
        "/home/player/.local/share/Steam/steamapps/common/Hollow Knight/hollow_knight.x86_64";

    fn header() -> Vec<String> {
        DEFAULT_HEADER.iter().map(|s| s.to_string()).collect()
    }

    fn record(id: &str, path: &str) -> GameRecord {
        GameRecord::new(
            id.to_string(),
            format!("Game {}", id),
            "2.1".to_string(),
            path.to_string(),
        )
    }

    #[test]
    fn test_column_offsets() {
        assert_eq!(column_offsets(), [0, 5, 35, 45, 85, 98, 111, 127]);
    }

    #[test]
    fn test_header_row_is_raw_text() {
        let mut played = record("1", "/g/one");
        played.last_session_seconds = Some(61);
        played.total_seconds = Some(3661);
        let grid = table_grid(&header(), &[played], 0);

        assert_eq!(grid.len(), 2);
        assert!(!grid[0].highlighted);
        assert_eq!(grid[0].cells[0], "id");
        assert_eq!(grid[0].cells[6], "| bef_play_time");
        assert_eq!(grid[0].cells[7], "| total");
    }

    #[test]
    fn test_data_row_cells() {
        let mut played = record("7", "/g/seven");
        played.first_played = "2024/01/01".to_string();
        played.last_played = "2024/02/02".to_string();
        played.last_session_seconds = Some(61);
        played.total_seconds = Some(3661);
        let grid = table_grid(&header(), &[played], 0);

        assert_eq!(
            grid[1].cells,
            vec![
                "7",
                "| Game 7",
                "| 2.1",
                "| /g/seven",
                "| 2024/01/01",
                "| 2024/02/02",
                "| 00:01:01",
                "| 01:01:01",
            ]
        );
    }

    #[test]
    fn test_unplayed_durations_stay_blank() {
        let grid = table_grid(&header(), &[record("1", "/g")], 0);
        assert_eq!(grid[1].cells[4], "| ");
        assert_eq!(grid[1].cells[6], "| ");
        assert_eq!(grid[1].cells[7], "| ");
    }

    #[test]
    fn test_only_selected_row_is_highlighted() {
        let records: Vec<GameRecord> = (1..=4).map(|i| record(&i.to_string(), "/g")).collect();
        let grid = table_grid(&header(), &records, 2);

        let highlighted: Vec<usize> = grid
            .iter()
            .enumerate()
            .filter(|(_, row)| row.highlighted)
            .map(|(i, _)| i)
            .collect();
        // Grid row 3 is record 2 because of the header
        assert_eq!(highlighted, vec![3]);
    }

    #[test]
    fn test_empty_records_render_header_only() {
        let grid = table_grid(&header(), &[], 0);
        assert_eq!(grid.len(), 1);
        assert!(!grid[0].highlighted);
    }

    #[test]
    fn test_short_header_is_padded() {
        let short = vec!["id".to_string(), "name".to_string()];
        let grid = table_grid(&short, &[], 0);
        assert_eq!(grid[0].cells.len(), 8);
        assert_eq!(grid[0].cells[7], "| ");
    }

    #[test]
    fn test_path_within_width_is_untouched() {
        let exact = "a".repeat(PATH_WIDTH as usize);
        assert_eq!(elide_path(&exact), exact);
        assert_eq!(elide_path("/usr/games/nethack"), "/usr/games/nethack");
    }

    #[test]
    fn test_long_path_keeps_its_tail() {
        let path = "/home/player/.local/share/Steam/steamapps/common/Hollow Knight/hollow_knight.x86_64";
        let shown = elide_path(path);

        assert!(shown.starts_with("..."));
        let tail = &shown[3..];
        assert!(path.ends_with(tail));
        assert_eq!(tail.chars().count(), PATH_WIDTH as usize - 6);
        assert!(shown.chars().count() + SEPARATOR.len() <= PATH_WIDTH as usize);

        let grid = table_grid(&header(), &[record("1", path)], 0);
        assert_eq!(grid[1].cells[3], format!("| {}", shown));
    }

    #[test]
    fn test_long_path_with_multibyte_chars() {
        let path = format!("/ゲーム/{}/起動.exe", "データ".repeat(15));
        let shown = elide_path(&path);
        assert!(shown.starts_with("..."));
        assert!(shown.ends_with("/起動.exe"));
        assert_eq!(shown.chars().count(), PATH_WIDTH as usize - 3);
    }

    fn app_with(dir: &TempDir, games: &[(&str, &str)]) -> App {
        let mut store = RecordStore::load(&dir.path().join(STORE_FILE)).unwrap();
        for (name, path) in games {
            store.add_game(name, "1.5", path);
        }
        App::new(store, Box::new(ProcessLauncher), "%Y/%m/%d".to_string())
    }

    fn draw(app: &App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn text(buf: &Buffer, y: u16, from: u16, to: u16) -> String {
        (from..to).map(|x| buf[(x, y)].symbol()).collect()
    }

    // Lines: 0 key hint, 1 rule, 2 header, 3.. records
    #[test]
    fn test_wide_terminal_draws_full_columns() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(&dir, &[("Hollow Knight", STEAM_PATH)]);
        let buf = draw(&app, 200, 8);

        assert_eq!(text(&buf, 3, 0, 5), "1    ");
        assert_eq!(text(&buf, 3, 5, 20), "| Hollow Knight");
        assert_eq!(text(&buf, 3, 35, 40), "| 1.5");
        assert_eq!(text(&buf, 3, 45, 84), format!("| {}", elide_path(STEAM_PATH)));
        assert_eq!(text(&buf, 3, 85, 87), "| ");
        assert_eq!(text(&buf, 2, 45, 61), "| game_file_patn");
    }

    #[test]
    fn test_narrow_terminal_keeps_offsets_and_path_tail() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(&dir, &[("Hollow Knight", STEAM_PATH)]);
        let buf = draw(&app, 80, 8);

        // Offsets do not shrink with the terminal
        assert_eq!(text(&buf, 2, 0, 14), "id   | game_na");
        assert_eq!(text(&buf, 3, 5, 20), "| Hollow Knight");
        assert_eq!(text(&buf, 3, 35, 40), "| 1.5");
        assert_eq!(buf[(45, 3)].symbol(), "|");

        let path_cell = text(&buf, 3, 45, 80);
        assert!(path_cell.starts_with("| ..."));
        assert!(path_cell.ends_with("hollow_knight.x86_64"));
        assert!(STEAM_PATH.ends_with(&path_cell[5..]));
    }

    #[test]
    fn test_selected_row_is_green() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, &[("A", "/a"), ("B", "/b")]);
        app.handle_key_event(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE))
            .unwrap();
        let buf = draw(&app, 150, 8);

        assert_ne!(buf[(0, 3)].fg, Color::Green);
        assert_eq!(buf[(0, 4)].fg, Color::Green);
        assert_eq!(text(&buf, 4, 0, 1), "2");
    }

    #[test]
    fn test_selection_scrolls_into_view() {
        let dir = tempfile::tempdir().unwrap();
        let games: Vec<(String, String)> = (1..=10)
            .map(|i| (format!("Game {}", i), format!("/g/{}", i)))
            .collect();
        let refs: Vec<(&str, &str)> = games
            .iter()
            .map(|(n, p)| (n.as_str(), p.as_str()))
            .collect();
        let mut app = app_with(&dir, &refs);
        app.handle_key_event(KeyEvent::new(KeyCode::End, KeyModifiers::NONE))
            .unwrap();

        // 8 lines: table gets 5, header plus four records
        let buf = draw(&app, 150, 8);
        assert_eq!(text(&buf, 2, 0, 2), "id");
        assert_eq!(text(&buf, 3, 0, 5).trim(), "7");
        assert_eq!(text(&buf, 6, 0, 5).trim(), "10");
        assert_eq!(buf[(0, 6)].fg, Color::Green);
    }

    #[test]
    fn test_empty_table_draws_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(&dir, &[]);
        let buf = draw(&app, 80, 6);
        assert_eq!(text(&buf, 2, 0, 2), "id");
        assert_eq!(text(&buf, 3, 0, 80).trim(), "");
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(0, 4), 0);
        assert_eq!(scroll_offset(3, 4), 0);
        assert_eq!(scroll_offset(4, 4), 1);
        assert_eq!(scroll_offset(9, 4), 6);
        assert_eq!(scroll_offset(5, 0), 0);
    }

    #[test]
    fn test_fit_cell_clips_from_the_right() {
        assert_eq!(fit_cell(1, "| Hollow Knight", 8), "| Hollow");
        assert_eq!(fit_cell(1, "| Hades", 30), "| Hades");
        assert_eq!(fit_cell(PATH_COLUMN, "| /usr/games/nethack", 12), "| ...nethack");
        // Too narrow to elide
        assert_eq!(fit_cell(PATH_COLUMN, "| /usr/games/nethack", 4), "| /u");
    }
}
