//! Runtime - Mount an element tree in the terminal and drive it.
//!
//! Each tick is one host idle slot:
//! 1. run the work loop for `slice_budget`
//! 2. redraw if the host changed
//! 3. poll input for `poll_interval` (not at all while work is pending)
//! 4. route the event; listeners may queue state updates for the next tick
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::runtime;
//!
//! let mut handle = runtime::mount(app(), RuntimeConfig::from_env())?;
//!
//! // Option 1: blocking loop, until Esc / Ctrl+C / stop()
//! runtime::run(&mut handle)?;
//!
//! // Option 2: tick manually
//! while runtime::tick(&mut handle)? {
//!     // Your logic here
//! }
//! ```

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::cursor::{self, Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};

use crate::config::{RenderMode, RuntimeConfig};
use crate::element::Element;
use crate::engine::{Renderer, SliceOutcome, TimeBudget};
use crate::error::RenderError;
use crate::host::{Dirty, NodeId, TerminalHost};

// =============================================================================
// Mount Handle
// =============================================================================

/// A mounted tree: the renderer, its container and the running flag.
///
/// Dropping the handle restores the terminal.
pub struct MountHandle {
    renderer: Renderer<TerminalHost>,
    container: NodeId,
    config: RuntimeConfig,
    running: Arc<AtomicBool>,
    origin: u16,
    terminal_active: bool,
}

impl MountHandle {
    fn new(element: Element, config: RuntimeConfig) -> Self {
        let mut host = TerminalHost::new();
        let container = host.create_container();
        let mut renderer = Renderer::new(host);
        renderer.render(element, container);

        Self {
            renderer,
            container,
            config,
            running: Arc::new(AtomicBool::new(true)),
            origin: 0,
            terminal_active: false,
        }
    }

    /// A handle that never touches the terminal. Drive it with
    /// [`MountHandle::step`] and [`MountHandle::handle_event`].
    pub fn headless(element: Element, config: RuntimeConfig) -> Self {
        Self::new(element, config)
    }

    /// Replace the mounted tree. Commits on a later tick.
    pub fn render(&mut self, element: Element) {
        self.renderer.render(element, self.container);
    }

    pub fn renderer(&self) -> &Renderer<TerminalHost> {
        &self.renderer
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request shutdown; `run` returns after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Shared running flag, for stopping from inside event handlers.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Run one work slice and draw to `out` if anything visible changed.
    pub fn step(&mut self, out: &mut impl Write) -> Result<SliceOutcome, RenderError> {
        let mut deadline = TimeBudget::new(self.config.slice_budget);
        let outcome = self.renderer.work_loop(&mut deadline)?;

        if outcome.is_committed() || self.renderer.host().dirty() != Dirty::empty() {
            let (container, origin) = (self.container, self.origin);
            self.renderer.host_mut().draw(out, container, origin)?;
        }
        Ok(outcome)
    }

    /// Route one terminal event.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if is_exit_key(&key) {
                    tracing::debug!("exit key, stopping");
                    self.stop();
                    return;
                }
                let container = self.container;
                self.renderer.host_mut().handle_key(container, key);
            }
            Event::Resize(..) => self.renderer.host_mut().invalidate(),
            _ => {}
        }
    }

    /// Put the terminal into raw mode for this handle.
    fn enter_terminal(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.terminal_active = true;

        let mut out = io::stdout();
        match self.config.render_mode {
            RenderMode::Fullscreen => {
                execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
                self.origin = 0;
            }
            RenderMode::Inline => {
                execute!(out, Hide)?;
                self.origin = cursor::position()?.1;
            }
        }
        Ok(())
    }

    fn leave_terminal(&mut self) -> io::Result<()> {
        if !self.terminal_active {
            return Ok(());
        }
        self.terminal_active = false;

        let mut out = io::stdout();
        match self.config.render_mode {
            RenderMode::Fullscreen => execute!(out, LeaveAlternateScreen, Show)?,
            RenderMode::Inline => {
                let drawn = self.renderer.host().layout(self.container).len() as u16;
                execute!(out, MoveTo(0, self.origin.saturating_add(drawn)), Show)?;
            }
        }
        terminal::disable_raw_mode()
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        // Best effort
        let _ = self.leave_terminal();
    }
}

fn is_exit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Mount `element` in the terminal.
///
/// The first frame is drawn by the first [`tick`].
pub fn mount(element: Element, config: RuntimeConfig) -> Result<MountHandle, RenderError> {
    let mut handle = MountHandle::new(element, config);
    handle.enter_terminal()?;
    tracing::debug!(mode = ?config.render_mode, "mounted");
    Ok(handle)
}

/// Restore the terminal and drop the tree.
pub fn unmount(mut handle: MountHandle) -> Result<(), RenderError> {
    handle.stop();
    handle.leave_terminal()?;
    Ok(())
}

// =============================================================================
// Event Loop
// =============================================================================

/// One idle slot. Returns `Ok(false)` once the handle has been stopped.
pub fn tick(handle: &mut MountHandle) -> Result<bool, RenderError> {
    if !handle.is_running() {
        return Ok(false);
    }

    let mut out = io::stdout();
    handle.step(&mut out)?;

    // Keep working without waiting on input while a render is in flight.
    let timeout = if handle.renderer.has_pending_work() {
        Duration::ZERO
    } else {
        handle.config.poll_interval
    };
    if event::poll(timeout)? {
        handle.handle_event(event::read()?);
    }

    Ok(handle.is_running())
}

/// Tick until stopped.
pub fn run(handle: &mut MountHandle) -> Result<(), RenderError> {
    while tick(handle)? {}
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Component, Props};
    use crate::engine::Hooks;
    use crate::h;

    fn config() -> RuntimeConfig {
        RuntimeConfig::default().with_slice_budget(Duration::from_secs(5))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn clicker(_: &Props, hooks: &mut Hooks) -> Element {
        let (clicks, set_clicks) = hooks.use_state(0);
        let onclick = move |_: &crate::types::HostEvent| {
            if let Err(err) = set_clicks.update(|n| n + 1) {
                tracing::error!(%err, "click");
            }
        };
        h!(
            "div",
            None,
            h!("p", None, "Clicks: ", clicks),
            h!("button", Some(Props::new().on("onClick", onclick)), "+"),
        )
    }

    #[test]
    fn test_step_commits_and_draws() {
        let mut handle = MountHandle::headless(h!("p", None, "hello"), config());
        let mut out = Vec::new();

        let outcome = handle.step(&mut out).unwrap();
        assert!(outcome.is_committed());
        assert!(!out.is_empty());
        assert_eq!(handle.renderer().host().document().text_content(handle.container()), "hello");

        // Nothing left: no draw
        let mut again = Vec::new();
        assert_eq!(handle.step(&mut again).unwrap(), SliceOutcome::Idle);
        assert!(again.is_empty());
    }

    #[test]
    fn test_keys_drive_state_updates() {
        let mut handle = MountHandle::headless(h!(Component::new(clicker)), config());
        let mut out = Vec::new();
        handle.step(&mut out).unwrap();

        handle.handle_event(key(KeyCode::Tab));
        handle.handle_event(key(KeyCode::Enter));
        handle.handle_event(key(KeyCode::Enter));
        assert!(handle.renderer().has_pending_work());

        handle.step(&mut out).unwrap();
        let text = handle.renderer().host().document().text_content(handle.container());
        assert_eq!(text, "Clicks: 2+");
    }

    #[test]
    fn test_exit_keys_stop() {
        let mut handle = MountHandle::headless(h!("p"), config());
        assert!(handle.is_running());

        handle.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!handle.is_running());
        assert!(!tick(&mut handle).unwrap());
    }

    #[test]
    fn test_rerender_through_handle() {
        let mut handle = MountHandle::headless(h!("h2", None, "Hello World"), config());
        let mut out = Vec::new();
        handle.step(&mut out).unwrap();

        handle.render(h!("h2", None, "Hello Rust"));
        handle.step(&mut out).unwrap();

        let lines = handle.renderer().host().layout(handle.container());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Hello Rust");
    }
}
