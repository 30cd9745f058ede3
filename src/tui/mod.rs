mod app_logic;
mod app_state;
mod event_handler;
mod ui_renderer;

pub use app_state::TuiAction;

pub use self::run_tui::run_selection;

// Main TUI loop and terminal setup/teardown
mod run_tui {
    use super::app_logic::TuiApp;
    use super::app_state::TuiAction;
    use super::event_handler::handle_events;
    use super::ui_renderer::ui_frame;
    use crate::selection::SelectionModel;
    use anyhow::Result;
    use crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::prelude::{CrosstermBackend, Terminal};
    use std::io::{self, Stdout};

    /// Let the user adjust `model` and pick an action. `None` means cancelled.
    /// The model is handed back either way.
    pub fn run_selection<M>(
        model: SelectionModel<M>,
    ) -> Result<(Option<TuiAction>, SelectionModel<M>)> {
        let mut app = TuiApp::new(model);

        let mut terminal = init_terminal()?;
        let outcome = run_loop(&mut terminal, &mut app);
        restore_terminal(terminal)?;
        outcome?;

        Ok(app.into_parts())
    }

    fn run_loop<M>(
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        app: &mut TuiApp<M>,
    ) -> Result<()> {
        while !app.quit {
            terminal.draw(|frame| ui_frame(frame, app))?;
            handle_events(app)?;
        }
        Ok(())
    }

    fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).map_err(Into::into)
    }

    fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor().map_err(Into::into)
    }
}
