//! Line-driven shell loop: one input line, at most one intent, dispatched to
//! completion before the next line is read.

use std::{io::Write, sync::Arc};

use anyhow::{Context, Result};
use quiz_core::SessionController;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::broadcast::error::RecvError,
};
use tracing::debug;

use crate::shell::{self, parse_command, render, Command};

struct Screen<W> {
    out: W,
    last_frame: String,
}

impl<W: Write> Screen<W> {
    async fn redraw(&mut self, controller: &SessionController) -> Result<()> {
        let frame = render(&controller.view().await);
        if frame != self.last_frame {
            writeln!(self.out, "\n{frame}").context("failed to write frame")?;
            self.out.flush().context("failed to flush output")?;
            self.last_frame = frame;
        }
        Ok(())
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{line}").context("failed to write output")
    }
}

/// Runs the shell until `quit` or end of input. An intent that is still in
/// flight when input ends is awaited, and its result rendered, before returning.
pub async fn run_shell<R, W>(controller: &Arc<SessionController>, input: R, out: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut events = controller.subscribe();
    let mut lines = input.lines();
    let mut screen = Screen {
        out,
        last_frame: String::new(),
    };
    screen.redraw(controller).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                let view = controller.view().await;
                match parse_command(&view, &line) {
                    Command::Quit => break,
                    Command::Help => screen.say(shell::help(&view))?,
                    Command::Busy => screen.say("Loading...")?,
                    Command::Unknown(input) => {
                        screen.say(&format!("unrecognised input '{input}'; {}", shell::help(&view)))?;
                    }
                    Command::Intent(intent) => {
                        let dispatch = controller.dispatch(intent);
                        tokio::pin!(dispatch);
                        loop {
                            tokio::select! {
                                result = &mut dispatch => {
                                    if let Err(err) = result {
                                        debug!(error = %err, "intent failed");
                                    }
                                    break;
                                }
                                event = events.recv() => {
                                    redraw_on_event(&mut screen, controller, event).await?;
                                }
                            }
                        }
                        screen.redraw(controller).await?;
                    }
                }
            }
            event = events.recv() => {
                if !redraw_on_event(&mut screen, controller, event).await? {
                    break;
                }
            }
        }
    }

    screen.redraw(controller).await
}

/// Returns `false` once the controller's event channel is closed.
async fn redraw_on_event<W: Write>(
    screen: &mut Screen<W>,
    controller: &SessionController,
    event: Result<quiz_core::SessionEvent, RecvError>,
) -> Result<bool> {
    match event {
        Ok(_) | Err(RecvError::Lagged(_)) => {
            screen.redraw(controller).await?;
            Ok(true)
        }
        Err(RecvError::Closed) => Ok(false),
    }
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
