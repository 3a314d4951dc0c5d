//! TUI module - Terminal dashboard with ratatui

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::Backend,
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{stdout, Stdout};

use crate::machines::{all_machines, find_machine};
use crate::models::Session;
use crate::progress::{Change, MachineProgress, WeeklyVolume, tracked_progress, weight_lifted_by_week};
use crate::store::{DocumentStore, KeyValueStore};
use crate::tracker::Tracker;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Weeks shown in the volume panel
const WEEKS_SHOWN: usize = 8;
const BAR_WIDTH: usize = 30;

/// App state for TUI
pub struct App<D, K> {
    tracker: Tracker<D, K>,
    profile_name: Option<String>,
    sessions: Vec<Session>,
    progress: Vec<MachineProgress>,
    weeks: Vec<WeeklyVolume>,
    should_quit: bool,
}

impl<D: DocumentStore, K: KeyValueStore> App<D, K> {
    pub fn new(tracker: Tracker<D, K>) -> Result<Self> {
        let mut app = Self {
            tracker,
            profile_name: None,
            sessions: Vec::new(),
            progress: Vec::new(),
            weeks: Vec::new(),
            should_quit: false,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Reload sessions and recompute everything shown
    fn refresh(&mut self) -> Result<()> {
        let profile = self.tracker.current_profile()?;
        self.sessions = match &profile {
            Some(p) => self.tracker.sessions_for(&p.id)?,
            None => Vec::new(),
        };
        self.profile_name = profile.map(|p| p.name);
        self.progress = tracked_progress(all_machines(), &self.sessions);

        let weeks = weight_lifted_by_week(&self.sessions);
        let skip = weeks.len().saturating_sub(WEEKS_SHOWN);
        self.weeks = weeks.into_iter().skip(skip).collect();
        Ok(())
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal);
        finish(result, restore_terminal)
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let who = self.profile_name.as_deref().unwrap_or("not logged in");
        let header = Paragraph::new(format!("gymtrack - {}", who))
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        frame.render_widget(self.progress_table(), middle[0]);
        frame.render_widget(self.weekly_panel(), middle[1]);
        frame.render_widget(self.history_table(), chunks[2]);

        // Footer
        let footer = Paragraph::new("q: quit | r: refresh")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn progress_table(&self) -> Table<'_> {
        let rows: Vec<Row> = self.progress.iter().map(|p| {
            let color = match p.change {
                Change::Up => Color::Green,
                Change::Down => Color::Red,
                Change::Same => Color::Yellow,
                Change::New => Color::Gray,
            };
            Row::new(vec![
                Cell::from(p.name.clone()),
                Cell::from(weight_cell(p.last_weight)),
                Cell::from(weight_cell(p.prev_weight)),
                Cell::from(p.change.arrow()).style(Style::default().fg(color)),
            ])
        }).collect();

        Table::new(
            rows,
            [
                Constraint::Min(18),
                Constraint::Length(9),
                Constraint::Length(9),
                Constraint::Length(5),
            ],
        )
        .header(Row::new(vec!["Machine", "Last", "Week ago", ""])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Progress"))
    }

    fn weekly_panel(&self) -> Paragraph<'_> {
        let max = self.weeks.iter().map(|w| w.total).fold(0.0_f64, f64::max);
        let lines: Vec<Line> = self.weeks.iter().map(|w| {
            let len = if max > 0.0 { ((w.total / max) * BAR_WIDTH as f64).round() as usize } else { 0 };
            Line::from(vec![
                Span::raw(format!("{} ", w.week.format("%m-%d"))),
                Span::styled("█".repeat(len), Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {:.0}", w.total)),
            ])
        }).collect();

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Weekly volume, kg"))
    }

    fn history_table(&self) -> Table<'_> {
        let rows: Vec<Row> = self.sessions.iter().map(|s| {
            Row::new(vec![
                Cell::from(s.date.format("%Y-%m-%d").to_string()),
                Cell::from(find_machine(s.machine_id).map(|m| m.name).unwrap_or("?")),
                Cell::from(format!("{:.1}kg x{}", s.weight, s.reps)),
                Cell::from(s.difficulty.label()),
            ])
        }).collect();

        Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(20),
                Constraint::Length(14),
                Constraint::Min(8),
            ],
        )
        .header(Row::new(vec!["Date", "Machine", "Load", "Difficulty"])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Sessions"))
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => self.should_quit = true,
                        KeyCode::Char('r') => self.refresh()?,
                        _ => {}
                    }
                }
        Ok(())
    }
}

/// Run `restore` whatever `result` is, then hand `result` back
fn finish<T>(result: Result<T>, restore: impl FnOnce() -> Result<()>) -> Result<T> {
    restore()?;
    result
}

fn weight_cell(w: Option<f64>) -> String {
    w.map(|w| format!("{:.1}", w)).unwrap_or_else(|| "-".to_string())
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
