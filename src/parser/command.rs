//! Typed trace commands.
//!
//! Converts the fields produced by the lexer into a [`Command`]. Validation
//! happens here so the model only ever sees well-formed commands.

use crate::model::ParseError;

/// Command mnemonics as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `CAL` - function entry.
    Call,
    /// `RET` - function exit.
    Return,
    /// `PHS` - replace the current frame (phase change).
    Phase,
    /// `TNM` - rename a lifeline.
    ThreadName,
    /// `SND` - message sent.
    Send,
    /// `RCV` - message received.
    Recv,
    /// `EVT` - marker event.
    Event,
    /// `INF` - annotate the latest entity.
    Info,
    /// `TRM` - terminate the lifeline.
    Terminate,
}

impl CommandKind {
    /// All kinds, in wire-table order.
    pub const ALL: [CommandKind; 9] = [
        CommandKind::Call,
        CommandKind::Return,
        CommandKind::Phase,
        CommandKind::ThreadName,
        CommandKind::Send,
        CommandKind::Recv,
        CommandKind::Event,
        CommandKind::Info,
        CommandKind::Terminate,
    ];

    /// Three-letter mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            CommandKind::Call => "CAL",
            CommandKind::Return => "RET",
            CommandKind::Phase => "PHS",
            CommandKind::ThreadName => "TNM",
            CommandKind::Send => "SND",
            CommandKind::Recv => "RCV",
            CommandKind::Event => "EVT",
            CommandKind::Info => "INF",
            CommandKind::Terminate => "TRM",
        }
    }

    /// Look up a mnemonic.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.mnemonic() == s)
    }

    /// Number of arguments after the mnemonic.
    pub fn arity(self) -> usize {
        match self {
            CommandKind::Terminate => 1,
            CommandKind::Return | CommandKind::ThreadName | CommandKind::Info => 2,
            CommandKind::Call
            | CommandKind::Phase
            | CommandKind::Send
            | CommandKind::Recv
            | CommandKind::Event => 3,
        }
    }

    /// Whether the final argument is free text that may span several
    /// unquoted tokens.
    fn trailing_text(self) -> bool {
        matches!(
            self,
            CommandKind::ThreadName | CommandKind::Event | CommandKind::Info
        )
    }
}

/// Producer-side time stamp. Carried for the journal and inspector; never
/// used for placement.
pub type TraceTime = u64;

/// A validated trace command. `thread` is the raw (unqualified) id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `CAL <thread> <time> <name>`
    Call {
        /// Raw thread id.
        thread: String,
        /// Producer time.
        time: TraceTime,
        /// Function name.
        name: String,
    },
    /// `RET <thread> <time>`
    Return {
        /// Raw thread id.
        thread: String,
        /// Producer time.
        time: TraceTime,
    },
    /// `PHS <thread> <time> <name>`
    Phase {
        /// Raw thread id.
        thread: String,
        /// Producer time.
        time: TraceTime,
        /// New phase name.
        name: String,
    },
    /// `TNM <thread> <name>`
    ThreadName {
        /// Raw thread id.
        thread: String,
        /// Display name.
        name: String,
    },
    /// `SND <thread> <time> <correlation>`
    Send {
        /// Raw thread id.
        thread: String,
        /// Producer time.
        time: TraceTime,
        /// Correlation id.
        correlation: String,
    },
    /// `RCV <thread> <time> <correlation>`
    Recv {
        /// Raw thread id.
        thread: String,
        /// Producer time.
        time: TraceTime,
        /// Correlation id.
        correlation: String,
    },
    /// `EVT <thread> <time> <label>`
    Event {
        /// Raw thread id.
        thread: String,
        /// Producer time.
        time: TraceTime,
        /// Marker label.
        label: String,
    },
    /// `INF <thread> <text>`
    Info {
        /// Raw thread id.
        thread: String,
        /// Annotation text.
        text: String,
    },
    /// `TRM <thread>`
    Terminate {
        /// Raw thread id.
        thread: String,
    },
}

impl Command {
    /// Parse the fields of one line (mnemonic first).
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for unknown mnemonics, wrong arity, a time field
    /// that is not an unsigned integer, or an empty name/correlation id.
    pub fn parse<S: AsRef<str>>(fields: &[S]) -> Result<Self, ParseError> {
        let Some((head, args)) = fields.split_first() else {
            return Err(ParseError::UnknownCommand(String::new()));
        };
        let head = head.as_ref();
        let kind = CommandKind::from_mnemonic(head)
            .ok_or_else(|| ParseError::UnknownCommand(head.to_string()))?;
        let command = kind.mnemonic();

        let expected = kind.arity();
        let arity_ok = if kind.trailing_text() {
            args.len() >= expected
        } else {
            args.len() == expected
        };
        if !arity_ok {
            return Err(ParseError::Arity {
                command,
                expected,
                found: args.len(),
            });
        }

        let arg = |i: usize| args[i].as_ref().to_string();
        let rest = |from: usize| {
            args[from..]
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(" ")
        };
        let time = |i: usize| -> Result<TraceTime, ParseError> {
            let raw = args[i].as_ref();
            raw.trim().parse().map_err(|_| ParseError::InvalidTime {
                command,
                value: raw.to_string(),
            })
        };
        let non_empty = |value: String, field: &'static str| {
            if value.is_empty() {
                Err(ParseError::EmptyField { command, field })
            } else {
                Ok(value)
            }
        };

        let thread = arg(0);
        Ok(match kind {
            CommandKind::Call => Command::Call {
                thread,
                time: time(1)?,
                name: non_empty(arg(2), "function name")?,
            },
            CommandKind::Return => Command::Return {
                thread,
                time: time(1)?,
            },
            CommandKind::Phase => Command::Phase {
                thread,
                time: time(1)?,
                name: non_empty(arg(2), "phase name")?,
            },
            CommandKind::ThreadName => Command::ThreadName {
                thread,
                name: rest(1),
            },
            CommandKind::Send => Command::Send {
                thread,
                time: time(1)?,
                correlation: non_empty(arg(2), "correlation id")?,
            },
            CommandKind::Recv => Command::Recv {
                thread,
                time: time(1)?,
                correlation: non_empty(arg(2), "correlation id")?,
            },
            CommandKind::Event => Command::Event {
                thread,
                time: time(1)?,
                label: rest(2),
            },
            CommandKind::Info => Command::Info {
                thread,
                text: rest(1),
            },
            CommandKind::Terminate => Command::Terminate { thread },
        })
    }

    /// Which command this is.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Call { .. } => CommandKind::Call,
            Command::Return { .. } => CommandKind::Return,
            Command::Phase { .. } => CommandKind::Phase,
            Command::ThreadName { .. } => CommandKind::ThreadName,
            Command::Send { .. } => CommandKind::Send,
            Command::Recv { .. } => CommandKind::Recv,
            Command::Event { .. } => CommandKind::Event,
            Command::Info { .. } => CommandKind::Info,
            Command::Terminate { .. } => CommandKind::Terminate,
        }
    }

    /// Raw thread id this command targets.
    pub fn thread(&self) -> &str {
        match self {
            Command::Call { thread, .. }
            | Command::Return { thread, .. }
            | Command::Phase { thread, .. }
            | Command::ThreadName { thread, .. }
            | Command::Send { thread, .. }
            | Command::Recv { thread, .. }
            | Command::Event { thread, .. }
            | Command::Info { thread, .. }
            | Command::Terminate { thread } => thread,
        }
    }

    /// Producer time, for commands that carry one.
    pub fn time(&self) -> Option<TraceTime> {
        match self {
            Command::Call { time, .. }
            | Command::Return { time, .. }
            | Command::Phase { time, .. }
            | Command::Send { time, .. }
            | Command::Recv { time, .. }
            | Command::Event { time, .. } => Some(*time),
            Command::ThreadName { .. } | Command::Info { .. } | Command::Terminate { .. } => None,
        }
    }

    /// Whether the thread id marks an incomplete, unroutable line.
    pub fn is_unroutable(&self) -> bool {
        is_unroutable_thread(self.thread())
    }

    /// Fields for the journal, with the thread id replaced by `thread`.
    pub fn to_fields(&self, thread: &str) -> Vec<String> {
        let mut fields = vec![self.kind().mnemonic().to_string(), thread.to_string()];
        if let Some(time) = self.time() {
            fields.push(time.to_string());
        }
        match self {
            Command::Call { name, .. } | Command::Phase { name, .. } => fields.push(name.clone()),
            Command::ThreadName { name, .. } => fields.push(name.clone()),
            Command::Send { correlation, .. } | Command::Recv { correlation, .. } => {
                fields.push(correlation.clone())
            }
            Command::Event { label, .. } => fields.push(label.clone()),
            Command::Info { text, .. } => fields.push(text.clone()),
            Command::Return { .. } | Command::Terminate { .. } => {}
        }
        fields
    }
}

/// `""` and `-` mark a line whose producer could not name its thread.
pub fn is_unroutable_thread(thread: &str) -> bool {
    thread.is_empty() || thread == "-"
}
