//! TUI rendering traits for schedulr types.
//!
//! Class blocks are drawn in blue, study suggestions in magenta.

use std::collections::HashMap;

use owo_colors::OwoColorize;
use schedulr_core::grid::{COLUMNS, ROWS, block_lines};
use schedulr_core::suggest::PlacementIssue;
use schedulr_core::{CalendarEvent, EventDetail, EventKind, WeekGrid};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// Paint text in the colors of its event kind
fn colorize_block(event: &CalendarEvent, text: &str) -> String {
    if event.is_study_suggestion() {
        text.white().on_magenta().to_string()
    } else {
        text.white().on_blue().to_string()
    }
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let marker = if self.is_study_suggestion() {
            "●".magenta().to_string()
        } else {
            "●".blue().to_string()
        };
        let when = format!("{} {}", self.start().format("%a"), self.time_range());
        let place = self.location().unwrap_or_default();

        format!("{} {} {} {}", marker, self.title(), when.dimmed(), place.dimmed())
    }
}

impl Render for EventDetail {
    fn render(&self) -> String {
        let heading = if self.kind == EventKind::StudySuggestion {
            self.heading.magenta().bold().to_string()
        } else {
            self.heading.blue().bold().to_string()
        };

        let mut lines = vec![heading, format!("  {}", self.title.bold()), format!("  {}", self.when)];
        if let Some(reason) = &self.reason {
            lines.push(format!("  {} {}", "Reason:".bold(), reason));
        }
        if let Some(location) = &self.location {
            lines.push(format!("  {}", location));
        }
        if let Some(notes) = &self.notes {
            lines.push(format!("  {} {}", "Notes:".bold(), notes));
        }
        lines.join("\n")
    }
}

impl Render for PlacementIssue {
    fn render(&self) -> String {
        format!("{} {}", "!".yellow(), self)
    }
}

const LABEL_WIDTH: usize = 6;
const CELL_WIDTH: usize = 14;

fn fit(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{:<width$}", clipped, width = width)
}

/// Draw the week as a text grid, one line per half-hour row.
pub fn render_grid(grid: &WeekGrid, events: &[CalendarEvent]) -> String {
    let by_id: HashMap<&str, &CalendarEvent> = events.iter().map(|e| (e.id(), e)).collect();
    let mut lines = Vec::new();

    let mut header = " ".repeat(LABEL_WIDTH + 1);
    for day in &grid.days {
        header.push_str(&fit(day, CELL_WIDTH).bold().to_string());
    }
    lines.push(header);

    for row in 0..ROWS {
        let label = if row % 2 == 0 {
            grid.hours.get((row / 2) as usize).map(String::as_str).unwrap_or_default()
        } else {
            ""
        };
        let mut line = format!("{:>width$} ", label, width = LABEL_WIDTH).dimmed().to_string();

        for column in 0..COLUMNS {
            // Later placements are drawn over earlier ones
            let covering = grid
                .column(column)
                .filter(|p| p.row_start <= row && row < p.row_end)
                .filter_map(|p| by_id.get(p.event_id.as_str()).map(|e| (p, *e)))
                .last();

            let cell = match covering {
                Some((placement, event)) => {
                    let text_lines = block_lines(event);
                    let text = text_lines
                        .get((row - placement.row_start) as usize)
                        .map(String::as_str)
                        .unwrap_or_default();
                    colorize_block(event, &fit(text, CELL_WIDTH))
                }
                None => fit(if row % 2 == 0 { "·" } else { "" }, CELL_WIDTH)
                    .dimmed()
                    .to_string(),
            };
            line.push_str(&cell);
        }
        lines.push(line);
    }

    lines.join("\n")
}
