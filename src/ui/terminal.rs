use {
    super::{
        layout::ChartOptions,
        renderer::{ChartRenderer, RenderError},
    },
    crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers},
    ratatui::{backend::CrosstermBackend, Terminal},
    std::{io::Stdout, time::Duration},
};

pub type TerminalRenderer = ChartRenderer<CrosstermBackend<Stdout>>;

/// Switch to the alternate screen and build the renderer that owns it.
///
/// Raw mode stays off while ingesting so Ctrl-C still raises SIGINT.
pub fn enter(options: ChartOptions, pause: Duration) -> Result<TerminalRenderer, RenderError> {
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    // Separate screen buffer keeps the chart apart from stderr logs
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;
    terminal.clear()?;

    Ok(ChartRenderer::new(terminal, options).with_pause(pause))
}

/// Keep the final frame on screen until the user presses 'q', Esc or Ctrl-C
pub fn hold_until_quit(renderer: &mut TerminalRenderer) -> Result<(), RenderError> {
    crossterm::terminal::enable_raw_mode()?;
    let result = wait_for_quit(renderer);
    crossterm::terminal::disable_raw_mode()?;
    result
}

fn wait_for_quit(renderer: &mut TerminalRenderer) -> Result<(), RenderError> {
    loop {
        if !crossterm::event::poll(Duration::from_millis(250))? {
            continue;
        }
        match crossterm::event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                _ => {}
            },
            // draw() resizes the viewport itself
            Event::Resize(_, _) => renderer.redraw()?,
            _ => {}
        }
    }
}

/// Leave the alternate screen and show the cursor again
pub fn restore() -> Result<(), RenderError> {
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    Ok(())
}
