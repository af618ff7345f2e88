//! Serial Command Protocol
//!
//! Line-oriented command dictionary for the instrument's serial port.
//! Bytes are accumulated until the terminator, the first token of the line
//! is matched exactly against the registered command names (first match
//! wins) and the bound handler runs with the remaining tokens. Lines whose
//! first token matches nothing go to the default handler.

use core::fmt::{self, Write};

use heapless::{String, Vec};

use crate::config::{
    COMMAND_BUFFER_SIZE, DEFAULT_COMMAND_TERMINATOR, MAX_COMMANDS, RESPONSE_BUFFER_SIZE,
};
use crate::runtime::{Pipeline, Route};

/// Text produced for the host while handling one line
pub type Response = String<RESPONSE_BUFFER_SIZE>;

/// Command handler bound to a name
pub type Handler<C> = fn(&mut C, &mut Args<'_>, &mut Response);

/// Acknowledgement written ahead of handler output
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Handlers alone produce output
    #[default]
    None,
    /// Matched command name and a newline
    EchoCommand,
    /// The whole received line and a newline, matched or not
    EchoFullCommand,
    /// `OK` and a newline on a match
    EchoOk,
    /// `1` on a match, `0` on a miss, no newline
    EchoOne,
}

/// Result of feeding one byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Line not complete, or blank
    Pending,
    /// Line handed to the default handler
    Unmatched,
    /// Line handled by a registered command
    Matched,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Dispatch {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Pending => defmt::write!(f, "pending"),
            Self::Unmatched => defmt::write!(f, "unmatched"),
            Self::Matched => defmt::write!(f, "matched"),
        }
    }
}

/// Command registration errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// All command slots are taken
    DictionaryFull,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DictionaryFull => write!(f, "command dictionary full"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for CommandError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::DictionaryFull => defmt::write!(f, "command dictionary full"),
        }
    }
}

/// Tokens following the command name
pub struct Args<'a> {
    command: &'a str,
    rest: &'a str,
    terminator: u8,
}

impl<'a> Args<'a> {
    fn new(line: &'a str, terminator: u8) -> Self {
        Self {
            command: "",
            rest: line,
            terminator,
        }
    }

    fn is_delimiter(&self, byte: u8) -> bool {
        byte == self.terminator || matches!(byte, b' ' | b',' | b'\n' | b'\r')
    }

    /// First token of the line
    #[must_use]
    pub fn command(&self) -> &'a str {
        self.command
    }

    /// Next token, `None` when the line is exhausted
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest;
        let bytes = rest.as_bytes();
        let Some(start) = bytes.iter().position(|&b| !self.is_delimiter(b)) else {
            self.rest = "";
            return None;
        };
        let len = bytes[start..]
            .iter()
            .position(|&b| self.is_delimiter(b))
            .unwrap_or(bytes.len() - start);
        let token = &rest[start..start + len];
        self.rest = &rest[start + len..];
        Some(token)
    }

    /// Next token as a float
    pub fn next_f32(&mut self) -> Option<f32> {
        self.next()?.parse().ok()
    }

    /// Next token as an unsigned integer
    pub fn next_u32(&mut self) -> Option<u32> {
        self.next()?.parse().ok()
    }
}

/// Fixed-capacity dictionary from command names to handlers over a context `C`
pub struct CommandDictionary<C, const CMDS: usize = MAX_COMMANDS> {
    buffer: Vec<u8, COMMAND_BUFFER_SIZE>,
    commands: Vec<(&'static str, Handler<C>), CMDS>,
    default_handler: Option<Handler<C>>,
    terminator: u8,
    mode: ResponseMode,
    response: Response,
}

impl<C, const CMDS: usize> CommandDictionary<C, CMDS> {
    /// Create an empty dictionary terminated by `\r`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            commands: Vec::new(),
            default_handler: None,
            terminator: DEFAULT_COMMAND_TERMINATOR,
            mode: ResponseMode::None,
            response: String::new(),
        }
    }

    /// Change the line terminator; it also acts as a token delimiter
    pub fn set_terminator(&mut self, terminator: u8) {
        self.terminator = terminator;
    }

    /// Select the acknowledgement style
    pub fn set_response_mode(&mut self, mode: ResponseMode) {
        self.mode = mode;
    }

    /// Bind `name` to `handler`
    ///
    /// # Errors
    /// Returns [`CommandError::DictionaryFull`] once `CMDS` commands are bound.
    pub fn add_command(&mut self, name: &'static str, handler: Handler<C>) -> Result<(), CommandError> {
        self.commands
            .push((name, handler))
            .map_err(|_| CommandError::DictionaryFull)
    }

    /// Handler for lines whose first token matches nothing
    pub fn set_default_handler(&mut self, handler: Handler<C>) {
        self.default_handler = Some(handler);
    }

    /// Registered command count
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// No commands registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Feed one received byte
    ///
    /// Non-printable bytes other than the terminator are ignored. A line
    /// longer than the buffer is discarded.
    pub fn feed(&mut self, byte: u8, ctx: &mut C) -> Dispatch {
        if byte == self.terminator {
            let outcome = self.dispatch(ctx);
            self.buffer.clear();
            return outcome;
        }

        if (0x20..0x7F).contains(&byte) && self.buffer.push(byte).is_err() {
            self.buffer.clear();
            #[cfg(feature = "embedded")]
            defmt::warn!("command buffer overflow, line dropped");
        }
        Dispatch::Pending
    }

    /// Output of the last handled line, leaving it empty
    pub fn take_response(&mut self) -> Response {
        core::mem::take(&mut self.response)
    }

    /// Partially received line
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Discard the partial line
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn dispatch(&mut self, ctx: &mut C) -> Dispatch {
        self.response.clear();
        let line = core::str::from_utf8(&self.buffer).unwrap_or("");
        if self.mode == ResponseMode::EchoFullCommand {
            let _ = writeln!(self.response, "{line}");
        }

        let mut args = Args::new(line, self.terminator);
        let Some(token) = args.next() else {
            return Dispatch::Pending;
        };
        args.command = token;

        let bound = self
            .commands
            .iter()
            .find(|(name, _)| *name == token)
            .map(|&(_, handler)| handler);

        if let Some(handler) = bound {
            match self.mode {
                ResponseMode::EchoCommand => {
                    let _ = writeln!(self.response, "{token}");
                }
                ResponseMode::EchoOk => {
                    let _ = self.response.push_str("OK\n");
                }
                ResponseMode::EchoOne => {
                    let _ = self.response.push('1');
                }
                ResponseMode::None | ResponseMode::EchoFullCommand => {}
            }
            handler(ctx, &mut args, &mut self.response);
            Dispatch::Matched
        } else {
            if let Some(handler) = self.default_handler {
                handler(ctx, &mut args, &mut self.response);
            }
            if self.mode == ResponseMode::EchoOne {
                let _ = self.response.push('0');
            }
            #[cfg(feature = "embedded")]
            defmt::debug!("unknown command {=str}", token);
            Dispatch::Unmatched
        }
    }
}

impl<C, const CMDS: usize> Default for CommandDictionary<C, CMDS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind the stock generator and routing commands
///
/// | command            | effect                                   |
/// |--------------------|------------------------------------------|
/// | `AMP <sd>`         | noise standard deviation                 |
/// | `LPF <hz>`         | noise low-pass cutoff                    |
/// | `LPFOFF`           | white noise                              |
/// | `SEED <n>`         | reseed the generator                     |
/// | `ROUTE <CAP\|LOOP>` | analyzer input                           |
/// | `STAT`             | `ticks,dropped_out,dropped_in,peak_bin`  |
///
/// Setters answer `ERR` when the argument is missing or malformed.
///
/// # Errors
/// Returns [`CommandError::DictionaryFull`] if the dictionary cannot hold
/// all six commands.
pub fn register_control_commands<const N: usize, const CMDS: usize>(
    dict: &mut CommandDictionary<Pipeline<'_, N>, CMDS>,
) -> Result<(), CommandError> {
    dict.add_command("AMP", amp_command::<N>)?;
    dict.add_command("LPF", lpf_command::<N>)?;
    dict.add_command("LPFOFF", lpf_off_command::<N>)?;
    dict.add_command("SEED", seed_command::<N>)?;
    dict.add_command("ROUTE", route_command::<N>)?;
    dict.add_command("STAT", stat_command::<N>)?;
    Ok(())
}

fn reject(out: &mut Response) {
    let _ = out.push_str("ERR\n");
}

fn amp_command<const N: usize>(pipeline: &mut Pipeline<'_, N>, args: &mut Args<'_>, out: &mut Response) {
    match args.next_f32() {
        Some(sd) => pipeline.noise_mut().amplitude(sd),
        None => reject(out),
    }
}

fn lpf_command<const N: usize>(pipeline: &mut Pipeline<'_, N>, args: &mut Args<'_>, out: &mut Response) {
    match args.next_f32() {
        Some(hz) if hz > 0.0 => pipeline.noise_mut().set_low_pass(hz),
        _ => reject(out),
    }
}

fn lpf_off_command<const N: usize>(pipeline: &mut Pipeline<'_, N>, _args: &mut Args<'_>, _out: &mut Response) {
    pipeline.noise_mut().clear_low_pass();
}

fn seed_command<const N: usize>(pipeline: &mut Pipeline<'_, N>, args: &mut Args<'_>, out: &mut Response) {
    match args.next_u32() {
        Some(seed) => pipeline.noise_mut().set_seed(seed),
        None => reject(out),
    }
}

fn route_command<const N: usize>(pipeline: &mut Pipeline<'_, N>, args: &mut Args<'_>, out: &mut Response) {
    match args.next() {
        Some("CAP") => pipeline.set_route(Route::Capture),
        Some("LOOP") => pipeline.set_route(Route::Loopback),
        _ => reject(out),
    }
}

fn stat_command<const N: usize>(pipeline: &mut Pipeline<'_, N>, _args: &mut Args<'_>, out: &mut Response) {
    let stats = pipeline.stats();
    let (peak_bin, _) = pipeline.analyzer().peak();
    let _ = writeln!(
        out,
        "{},{},{},{}",
        stats.ticks, stats.dropped_output, stats.dropped_input, peak_bin
    );
}
