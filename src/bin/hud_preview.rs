use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Style};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Paragraph};

use statbase_site::autoplay::HudDriver;
use statbase_site::config::{SiteConfig, load_dotenv};
use statbase_site::geometry::{Pt, polar};
use statbase_site::hud::{HudOptions, Scene};
use statbase_site::motion::Wedge;
use statbase_site::plays::{self, CANVAS, CENTER, Catalog, FIRST, HOME, RINGS, SECOND, THIRD};

const WEDGE_RAYS: usize = 6;

struct App {
    catalog: Catalog,
    driver: HudDriver,
    opts: HudOptions,
    should_quit: bool,
}

impl App {
    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('n') | KeyCode::Right => self.driver.skip(),
            _ => {}
        }
    }

    fn scene(&self) -> Scene {
        let snap = self.driver.snapshot();
        Scene::compose(self.catalog.get(snap.index), snap.t, &self.opts)
    }
}

fn main() -> Result<()> {
    load_dotenv();
    let cfg = SiteConfig::from_env();
    let catalog = match cfg.playbook_path.as_deref() {
        Some(path) => plays::load_catalog_file(path)?,
        None => plays::catalog().clone(),
    };
    let driver = HudDriver::spawn(catalog.len(), cfg.hud.timings);
    let mut app = App {
        catalog,
        driver,
        opts: HudOptions {
            show_play_card: cfg.hud.show_play_card,
            clamp_to_safe_area: cfg.hud.clamp_to_safe_area,
            ..HudOptions::default()
        },
        should_quit: false,
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let tick = cfg.hud.timings.frame.max(Duration::from_millis(33));
    let res = run_app(&mut terminal, &mut app, tick);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick: Duration,
) -> io::Result<()> {
    loop {
        let scene = app.scene();
        terminal.draw(|f| ui(f, &scene))?;

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// Terminal canvases grow upwards; the diagram's y axis grows downwards.
fn flip(p: Pt) -> (f64, f64) {
    (p.x, CANVAS - p.y)
}

fn line(ctx: &mut Context, a: Pt, b: Pt, color: Color) {
    let (x1, y1) = flip(a);
    let (x2, y2) = flip(b);
    ctx.draw(&CanvasLine {
        x1,
        y1,
        x2,
        y2,
        color,
    });
}

fn dot(ctx: &mut Context, p: Pt, radius: f64, color: Color) {
    let (x, y) = flip(p);
    ctx.draw(&Circle {
        x,
        y,
        radius,
        color,
    });
}

fn draw_wedge(ctx: &mut Context, wedge: &Wedge, color: Color) {
    let (a0, a1, r) = match wedge {
        Wedge::Spray(s) => (s.a0, s.a1, s.r),
        Wedge::Cone(c) => (c.a0, c.a1, c.r),
    };
    for i in 0..=WEDGE_RAYS {
        let a = a0 + (a1 - a0) * i as f64 / WEDGE_RAYS as f64;
        line(ctx, HOME, polar(HOME, r, a), color);
    }
}

fn ui(frame: &mut Frame, scene: &Scene) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(frame.size());

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(scene.label.as_str()))
        .x_bounds([0.0, CANVAS])
        .y_bounds([0.0, CANVAS])
        .paint(|ctx| {
            for r in RINGS {
                dot(ctx, CENTER, r, Color::DarkGray);
            }
            let diamond = [HOME, FIRST, SECOND, THIRD, HOME];
            for pair in diamond.windows(2) {
                line(ctx, pair[0], pair[1], Color::Gray);
            }
            if let Some(wedge) = &scene.wedge {
                draw_wedge(ctx, wedge, Color::Cyan);
            }
            for pair in scene.runner_trace.windows(2) {
                line(ctx, pair[0], pair[1], Color::Green);
            }
            for throw in &scene.throws {
                line(ctx, throw.from, throw.reached, Color::Yellow);
            }
            let blips = scene.blips.iter().map(|p| flip(*p)).collect::<Vec<_>>();
            ctx.draw(&Points {
                coords: &blips,
                color: Color::Magenta,
            });
            if let Some(runner) = scene.runner {
                dot(ctx, runner, 10.0, Color::LightGreen);
            }
            if let Some(ball) = scene.ball {
                dot(ctx, ball, 6.0, Color::White);
            }
        });
    frame.render_widget(canvas, chunks[0]);

    let we = &scene.gauge.expectancy;
    let status = format!(
        "WE {}%  ·  t={:.2}  ·  link {}ms  ·  {} fps  ·  n: next play  q: quit",
        we.percent, scene.t, scene.telemetry.link_ms, scene.telemetry.fps
    );
    let footer = Paragraph::new(status)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[1]);
}
