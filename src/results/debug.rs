//! Post-mortem debugging
//!
//! One [`Debugger`] is built for every recorded failure and error. Nothing
//! starts one automatically; [`start_interactive_mode`] lets the user pick a
//! recorded failure after the run when interactive debugging is enabled.

use std::io::{self, BufRead, Write};

use super::collector::ResultCollector;
use super::traceback::{absolute_path, source_lines, valid_frames};
use crate::models::FailureInfo;

/// A debugging session bound to one recorded failure
pub trait Debugger {
    fn start(&mut self, out: &mut dyn Write) -> io::Result<()>;
}

/// Builds a debugger for a recorded failure
pub type DebuggerFactory = Box<dyn Fn(&FailureInfo) -> Box<dyn Debugger>>;

/// Default factory producing [`PostMortem`] sessions
pub fn post_mortem_factory() -> DebuggerFactory {
    Box::new(|info: &FailureInfo| -> Box<dyn Debugger> {
        Box::new(PostMortem::new(info.clone()))
    })
}

/// Walks the frames of a failure and shows source around each one
#[derive(Clone, Debug)]
pub struct PostMortem {
    info: FailureInfo,
    context: u32,
}

impl PostMortem {
    pub fn new(info: FailureInfo) -> Self {
        Self { info, context: 2 }
    }

    pub fn with_context(mut self, lines: u32) -> Self {
        self.context = lines;
        self
    }

    pub fn info(&self) -> &FailureInfo {
        &self.info
    }
}

impl Debugger for PostMortem {
    fn start(&mut self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "> post-mortem: {}", self.info.summary_line())?;

        for (depth, frame) in valid_frames(&self.info).enumerate() {
            writeln!(
                out,
                "#{depth} {}:{} in {}",
                absolute_path(&frame.file).display(),
                frame.line,
                frame.function
            )?;
            match source_lines(&frame.file, frame.line, self.context) {
                Some(lines) => {
                    for (number, text) in lines {
                        let marker = if number == frame.line { "->" } else { "  " };
                        writeln!(out, "  {marker} {number:4} {text}")?;
                    }
                }
                None => writeln!(out, "     <no source available>")?,
            }
            for (name, value) in &frame.locals {
                writeln!(out, "     {name} = {value}")?;
            }
        }

        Ok(())
    }
}

/// Let the user pick recorded failures to debug
///
/// With a single session it starts right away. Otherwise errors then
/// failures are listed in report order and the user enters an index, or
/// `exit` (or end of input) to quit.
pub fn start_interactive_mode(
    result: &mut ResultCollector,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> io::Result<()> {
    if result.debugger_count() == 0 {
        return Ok(());
    }
    if result.debugger_count() == 1 {
        if let Some(debugger) = result.debugger_mut(0) {
            debugger.start(out)?;
        }
        return Ok(());
    }

    let listing: Vec<(usize, String)> = result
        .errors()
        .iter()
        .chain(result.failures())
        .map(|fault| (fault.slot, fault.description.clone()))
        .collect();

    loop {
        writeln!(out, "Choose a test to debug:")?;
        for (index, (_, descr)) in listing.iter().enumerate() {
            writeln!(out, "\t{index} : {descr}")?;
        }
        writeln!(out, "Type 'exit' (or ^D) to quit")?;
        writeln!(out)?;
        write!(out, "Enter a test name: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        let choice = line.trim();
        if choice.eq_ignore_ascii_case("exit") {
            writeln!(out)?;
            break;
        }

        let slot = choice
            .parse::<usize>()
            .ok()
            .and_then(|index| listing.get(index))
            .map(|(slot, _)| *slot);
        match slot.and_then(|slot| result.debugger_mut(slot)) {
            Some(debugger) => debugger.start(out)?,
            None => writeln!(out, "ERROR: invalid test number {choice:?}")?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frame, RunOptions, TestClass};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording {
        label: String,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Debugger for Recording {
        fn start(&mut self, _out: &mut dyn Write) -> io::Result<()> {
            self.log.borrow_mut().push(self.label.clone());
            Ok(())
        }
    }

    fn collector_with(log: &Rc<RefCell<Vec<String>>>) -> ResultCollector {
        let log = Rc::clone(log);
        ResultCollector::new(&RunOptions::new().pdb_mode(true))
            .with_stream(Box::new(io::sink()))
            .with_debugger_factory(Box::new(move |info: &FailureInfo| -> Box<dyn Debugger> {
                Box::new(Recording {
                    label: info.message.clone(),
                    log: Rc::clone(&log),
                })
            }))
    }

    #[test]
    fn test_single_session_starts_directly() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut result = collector_with(&log);
        let case = TestClass::new("m", "TC").case("test_a", |_| Ok(()));
        result.record_failure(&case.info, FailureInfo::new("AssertionError", "only"));

        let mut out = Vec::new();
        start_interactive_mode(&mut result, &mut io::empty(), &mut out).unwrap();
        assert_eq!(*log.borrow(), vec!["only".to_string()]);
    }

    #[test]
    fn test_choice_maps_to_report_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut result = collector_with(&log);
        let case = TestClass::new("m", "TC").case("test_a", |_| Ok(()));

        result.record_failure(&case.info, FailureInfo::new("AssertionError", "fail-0"));
        result.record_error(&case.info, FailureInfo::new("Error", "error-1"));
        result.record_failure(&case.info, FailureInfo::new("AssertionError", "fail-2"));

        // listing: 0 -> error-1, 1 -> fail-0, 2 -> fail-2
        let mut input = io::Cursor::new("2\nbogus\n0\nexit\n");
        let mut out = Vec::new();
        start_interactive_mode(&mut result, &mut input, &mut out).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["fail-2".to_string(), "error-1".to_string()]
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ERROR: invalid test number \"bogus\""));
        assert!(text.contains("\t0 : test_a (m.TC)"));
    }

    #[test]
    fn test_post_mortem_output() {
        let info = FailureInfo::new("AssertionError", "nope")
            .with_frame(Frame::new("missing.rs", 4, "test_x"))
            .with_local("value", &42);

        let mut out = Vec::new();
        PostMortem::new(info).start(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("> post-mortem: AssertionError: nope"));
        assert!(text.contains("#0 missing.rs:4 in test_x"));
        assert!(text.contains("value = 42"));
    }
}
