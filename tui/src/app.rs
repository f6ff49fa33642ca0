use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use linernotes::Session;
use ratatui::{backend::Backend, layout::Rect, text::Line, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::{markdown, ui};

const PAGE: u16 = 10;

pub struct App {
    session: Arc<Session>,
    /// The cycle or refresh task started last.
    pending: Option<AbortHandle>,
    polling: bool,
    /// Highest fraction shown for `progress_generation`.
    progress: f64,
    progress_generation: u64,
    rendered: Vec<Line<'static>>,
    rendered_generation: Option<u64>,
    banners: Vec<String>,
    showing_document: bool,
    scroll: u16,
    /// Text area of the document view as of the last draw.
    viewport: Rect,
    should_quit: bool,
}

impl App {
    pub fn new(session: Arc<Session>, pending: AbortHandle) -> Self {
        Self {
            session,
            pending: Some(pending),
            polling: true,
            progress: 0.0,
            progress_generation: 0,
            rendered: Vec::new(),
            rendered_generation: None,
            banners: Vec::new(),
            showing_document: false,
            scroll: 0,
            viewport: Rect::default(),
            should_quit: false,
        }
    }

    pub async fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        tick: Duration,
    ) -> anyhow::Result<()> {
        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.should_quit {
            self.draw(terminal)?;

            tokio::select! {
                _ = ticker.tick() => self.on_tick(),
                event = events.next() => match event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => self.on_key(key),
                    // Resizes and everything else only need the redraw above.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
            }
        }
        Ok(())
    }

    /// Sizes the document viewport for the current terminal, then draws.
    pub fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        self.set_viewport(ui::document_viewport(area, self.banners.len()));
        terminal.draw(|frame| ui::draw(frame, self))?;
        Ok(())
    }

    /// Keeps the scroll offset inside the document after a resize.
    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    fn is_refreshing(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Reads the shared state once. Stops polling when the cycle is sealed and
    /// no refresh is still resolving.
    pub fn on_tick(&mut self) {
        if !self.polling {
            return;
        }

        // Checked before the snapshot so a refresh that ends in between is
        // still picked up by this read.
        let refreshing = self.is_refreshing();
        let snapshot = self.session.state().snapshot();
        if snapshot.generation != self.progress_generation {
            self.progress_generation = snapshot.generation;
            self.progress = 0.0;
        }
        self.progress = self.progress.max(snapshot.completed_fraction);

        if !snapshot.finished {
            self.showing_document = false;
            return;
        }

        if self.rendered_generation != Some(snapshot.generation) {
            self.rendered = markdown::render_document(&snapshot.document);
            self.rendered_generation = Some(snapshot.generation);
            self.scroll = 0;
        }
        self.banners = snapshot.banners().into_iter().map(str::to_string).collect();
        self.showing_document = true;

        if !refreshing {
            debug!("Cycle {} displayed, polling stopped", snapshot.generation);
            self.polling = false;
            self.pending = None;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char('r') => self.refresh(),
            _ if self.showing_document => self.scroll_key(key.code),
            _ => {}
        }
    }

    fn refresh(&mut self) {
        info!("Manual refresh");
        self.pending = Some(self.session.refresh().abort_handle());
        self.polling = true;
    }

    fn scroll_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(PAGE as i32),
            KeyCode::PageUp => self.scroll_by(-(PAGE as i32)),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll = self.max_scroll(),
            _ => {}
        }
    }

    /// Offset that puts the last wrapped row at the bottom of the viewport.
    fn max_scroll(&self) -> u16 {
        let rows = ui::wrapped_height(&self.rendered, self.viewport.width);
        u16::try_from(rows.saturating_sub(self.viewport.height as usize)).unwrap_or(u16::MAX)
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (self.scroll as i32 + delta).clamp(0, self.max_scroll() as i32);
        self.scroll = next as u16;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn showing_document(&self) -> bool {
        self.showing_document
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn rendered(&self) -> &[Line<'static>] {
        &self.rendered
    }

    pub fn banners(&self) -> &[String] {
        &self.banners
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn refreshing(&self) -> bool {
        self.polling && self.showing_document && self.is_refreshing()
    }
}
