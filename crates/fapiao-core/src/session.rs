//! Review session: the parse/export state machine around a batch.

use tracing::debug;

use crate::error::SessionError;
use crate::models::invoice::InvoiceRecord;

/// What the session is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Parsing,
    Exporting,
}

impl SessionState {
    fn describe(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Parsing => "parsing",
            Self::Exporting => "exporting",
        }
    }
}

/// Holds the records of the latest batch and guards against re-entrant
/// parse or export requests.
///
/// Allowed transitions:
///
/// ```text
/// Idle --begin_parse--> Parsing --finish_parse--> Idle
/// Idle --begin_export--> Exporting --finish_export--> Idle
/// Idle --clear--> Idle
/// ```
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    records: Vec<InvoiceRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            records: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn records(&self) -> &[InvoiceRecord] {
        &self.records
    }

    /// Whether a new parse may start (the "parse" trigger is enabled).
    pub fn can_parse(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Whether an export may start.
    pub fn can_export(&self) -> bool {
        self.state == SessionState::Idle && !self.records.is_empty()
    }

    fn transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if self.state != from {
            return Err(SessionError::InvalidTransition {
                from: self.state.describe(),
                action,
            });
        }
        debug!("Session {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }

    pub fn begin_parse(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Idle, SessionState::Parsing, "parse")
    }

    /// Replace the batch state with the records of the finished run.
    pub fn finish_parse(&mut self, records: Vec<InvoiceRecord>) -> Result<(), SessionError> {
        self.transition(SessionState::Parsing, SessionState::Idle, "finish parsing")?;
        self.records = records;
        Ok(())
    }

    /// Start an export, returning the records to write.
    pub fn begin_export(&mut self) -> Result<&[InvoiceRecord], SessionError> {
        if self.state == SessionState::Idle && self.records.is_empty() {
            return Err(SessionError::Empty);
        }
        self.transition(SessionState::Idle, SessionState::Exporting, "export")?;
        Ok(&self.records)
    }

    pub fn finish_export(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Exporting, SessionState::Idle, "finish exporting")
    }

    /// Drop the current records.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidTransition {
                from: self.state.describe(),
                action: "clear",
            });
        }
        self.records.clear();
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
