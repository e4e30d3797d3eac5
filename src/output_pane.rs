// ── Output pane accessor ──────────────────────────────────────────────────────

use std::path::Path;

use crate::{error::Result, host::Host};

/// Output pane `WM_COMMAND` id that clears the pane.
pub const CMD_CLEAR: i32 = 1009;

/// The host's output pane.
pub struct OutputPane<'h, H: Host + ?Sized> {
    host: &'h H,
}

impl<'h, H: Host + ?Sized> OutputPane<'h, H> {
    pub(crate) fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Append `message` to the pane.
    pub fn output(&self, message: &str) -> Result<i32> {
        self.host.output(message)
    }

    /// Save the pane's contents and state.
    pub fn push(&self) -> Result<i32> {
        self.host.push()
    }

    /// Restore what the last `push` saved.
    pub fn pop(&self) -> Result<i32> {
        self.host.pop()
    }

    /// Forward a command id to the pane window.
    pub fn send_message(&self, command_id: i32) -> Result<isize> {
        self.host.send_message(command_id)
    }

    pub fn clear(&self) -> Result<isize> {
        self.send_message(CMD_CLEAR)
    }

    /// Directory relative paths printed to the pane resolve against.
    pub fn set_base_dir(&self, dir: impl AsRef<Path>) -> Result<i32> {
        self.host.set_base_dir(dir.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{Call, MemoryHost};

    #[test]
    fn push_pop_restores_contents() {
        let host = MemoryHost::new();
        let pane = OutputPane::new(&host);
        pane.output("first\r\n").expect("output");
        pane.push().expect("push");
        pane.output("second\r\n").expect("output");
        assert_eq!(host.pane_lines().len(), 2);
        assert_eq!(pane.pop().expect("pop"), 1);
        assert_eq!(host.pane_lines(), vec!["first\r\n".to_owned()]);
    }

    #[test]
    fn clear_is_command_1009() {
        let host = MemoryHost::new();
        let pane = OutputPane::new(&host);
        pane.output("x").expect("output");
        pane.clear().expect("clear");
        assert!(host.pane_lines().is_empty());
        assert_eq!(host.calls().last(), Some(&Call::SendMessage(1009)));
    }

    #[test]
    fn base_dir_is_forwarded() {
        let host = MemoryHost::new();
        OutputPane::new(&host).set_base_dir(r"C:\work").expect("set");
        assert_eq!(host.base_dir().as_deref(), Some(Path::new(r"C:\work")));
    }
}
