// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of ProgressPrinter structure for printing the progress of trajectory reading.

use colored::{ColoredString, Colorize};
use std::io::Write;

/// Progress of trajectory reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressStatus {
    /// Trajectory reading is in progress.
    Running,
    /// Trajectory has been read completely.
    Completed,
    /// Trajectory reading failed.
    Failed,
}

/// String that can be used inside `ProgressPrinter`.
#[derive(Debug, Clone, PartialEq)]
struct ProgressMessage {
    msg: ColoredString,
}

impl ProgressMessage {
    /// Create new `ProgressMessage`.
    ///
    /// ## Panics
    /// Panics if the string is longer than 9 characters.
    fn new(string: ColoredString) -> Self {
        if string.chars().count() > 9 {
            panic!("FATAL DCD_TOOLS ERROR | ProgressMessage::new | `ProgressMessage` can not be longer than 9 characters.");
        }

        ProgressMessage { msg: string }
    }

    /// Print formatted `ProgressMessage`.
    fn print(&self, out: &mut dyn Write, colored: bool) {
        if colored {
            write!(out, "[{: ^9}]   ", self.msg)
                .expect("FATAL DCD_TOOLS ERROR | ProgressMessage::print (1) | Could not write to `ProgressPrinter` stream.");
        } else {
            write!(out, "[{: ^9}]   ", self.msg.as_ref() as &str)
                .expect("FATAL DCD_TOOLS ERROR | ProgressMessage::print (2) | Could not write to `ProgressPrinter` stream.");
        }
    }
}

/// Structure handling printing of progress of reading a dcd file.
/// Constructed using `ProgressPrinter::new()` and associated with a
/// dcd reader using `DcdReader::print_progress()`.
pub struct ProgressPrinter {
    /// Stream to write the progress info to.
    output: Box<dyn Write>,
    /// Current status of reading. Default: ProgressStatus::Running.
    status: ProgressStatus,
    /// Frequency of printing. Print every `print_freq`th frame. Default: 100 frames.
    print_freq: usize,
    /// If true, the output will be colored. Default: true.
    colored: bool,
    /// String to be printed with the current frame number. Default: "Frame".cyan().
    frame_msg: ColoredString,
    /// String to be printed with the current simulation step. Default: "Step".bright_purple().
    step_msg: ColoredString,
    /// String to be printed when the trajectory reading is in progress. Default: "RUNNING".yellow().
    running_msg: ProgressMessage,
    /// String to be printed when the trajectory reading is completed. Default: "COMPLETED".green().
    completed_msg: ProgressMessage,
    /// String to be printed when the trajectory reading failed. Default: "FAILED!".red().
    failed_msg: ProgressMessage,
    /// String terminating the progress message. Default: `\r` (carriage return).
    terminating: String,
}

impl ProgressPrinter {
    /// Create an instance of `ProgressPrinter` with default parameters.
    ///
    /// The default values of the `ProgressPrinter` parameters.
    /// - `output`: `std::io::stdout()` (stream to write the progress info to)
    /// - `status`: `ProgressStatus::Running`
    /// - `print_freq`: `100` (progress info will be printed out every 100 frames read)
    /// - `colored`: `true`
    /// - `frame_msg`: `"Frame".cyan()`
    /// - `step_msg`: `"Step".bright_purple()`
    /// - `running_msg`: `"RUNNING".yellow()`
    /// - `completed_msg`: `"COMPLETED".green()`
    /// - `failed_msg`: `"FAILED!".red()`
    /// - `terminating`: `\r` (useful to set to `\n` when printing to a file)
    ///
    /// ## Example
    /// ```no_run
    /// use dcd_tools::prelude::*;
    /// use colored::Colorize;
    ///
    /// let printer = ProgressPrinter::new()
    ///     .with_print_freq(10)
    ///     .with_completed_msg("DONE".blue());
    ///
    /// for frame in DcdReader::open("chain.dcd").unwrap().print_progress(printer) {
    ///     let frame = frame.unwrap();
    ///     // analyze the frame
    /// }
    /// ```
    pub fn new() -> Self {
        ProgressPrinter {
            output: Box::from(std::io::stdout()),
            status: ProgressStatus::Running,
            print_freq: 100,
            colored: true,
            frame_msg: "Frame".cyan(),
            step_msg: "Step".bright_purple(),
            running_msg: ProgressMessage::new("RUNNING".yellow()),
            completed_msg: ProgressMessage::new("COMPLETED".green()),
            failed_msg: ProgressMessage::new("FAILED!".red()),
            terminating: String::from("\r"),
        }
    }

    /// Create new `ProgressPrinter` with specific `output` stream.
    pub fn with_output(mut self, stream: Box<dyn Write>) -> Self {
        self.output = stream;
        self
    }

    /// Set new status to an already constructed `ProgressPrinter`.
    pub fn set_status(&mut self, status: ProgressStatus) {
        self.status = status;
    }

    /// Get the current status of the `ProgressPrinter`.
    pub fn get_status(&self) -> ProgressStatus {
        self.status
    }

    /// Create new `ProgressPrinter` with specific value for `print_freq`.
    ///
    /// ## Panics
    /// Panics if `print_freq` is zero.
    pub fn with_print_freq(mut self, print_freq: usize) -> Self {
        if print_freq == 0 {
            panic!("FATAL DCD_TOOLS ERROR | ProgressPrinter::with_print_freq | Printing frequency must be positive.");
        }

        self.print_freq = print_freq;
        self
    }

    /// Create new `ProgressPrinter` with specific value for `colored`.
    pub fn with_colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Create new `ProgressPrinter` with specific value for `frame_msg`.
    pub fn with_frame_msg(mut self, frame_msg: ColoredString) -> Self {
        self.frame_msg = frame_msg;
        self
    }

    /// Create new `ProgressPrinter` with specific value for `step_msg`.
    pub fn with_step_msg(mut self, step_msg: ColoredString) -> Self {
        self.step_msg = step_msg;
        self
    }

    /// Create new `ProgressPrinter` with specific value for `running_msg`.
    ///
    /// ## Panics
    /// Panics if the `running_msg` is longer than 9 characters.
    pub fn with_running_msg(mut self, running_msg: ColoredString) -> Self {
        self.running_msg = ProgressMessage::new(running_msg);
        self
    }

    /// Create new `ProgressPrinter` with specific value for `completed_msg`.
    ///
    /// ## Panics
    /// Panics if the `completed_msg` is longer than 9 characters.
    pub fn with_completed_msg(mut self, completed_msg: ColoredString) -> Self {
        self.completed_msg = ProgressMessage::new(completed_msg);
        self
    }

    /// Create new `ProgressPrinter` with specific value for `failed_msg`.
    ///
    /// ## Panics
    /// Panics if the `failed_msg` is longer than 9 characters.
    pub fn with_failed_msg(mut self, failed_msg: ColoredString) -> Self {
        self.failed_msg = ProgressMessage::new(failed_msg);
        self
    }

    /// Create new `ProgressPrinter` with specific value for `terminating`.
    pub fn with_terminating(mut self, string: &str) -> Self {
        self.terminating = string.to_string();
        self
    }

    /// Print progress info about trajectory reading.
    pub fn print(&mut self, frame_number: usize, sim_step: i64) {
        if self.status == ProgressStatus::Running && frame_number % self.print_freq != 0 {
            return;
        }

        match self.status {
            ProgressStatus::Running => self.running_msg.print(&mut self.output, self.colored),
            ProgressStatus::Completed => self.completed_msg.print(&mut self.output, self.colored),
            ProgressStatus::Failed => self.failed_msg.print(&mut self.output, self.colored),
        }

        if self.colored {
            write!(
                self.output,
                "{} {:12} | {} {:12}{}",
                self.frame_msg, frame_number, self.step_msg, sim_step, self.terminating
            )
            .expect("FATAL DCD_TOOLS ERROR | ProgressPrinter::print (1) | Could not write to `ProgressPrinter` stream.");
        } else {
            write!(
                self.output,
                "{} {:12} | {} {:12}{}",
                self.frame_msg.as_ref() as &str,
                frame_number,
                self.step_msg.as_ref() as &str,
                sim_step,
                self.terminating
            )
            .expect("FATAL DCD_TOOLS ERROR | ProgressPrinter::print (2) | Could not write to `ProgressPrinter` stream.");
        }

        if self.status != ProgressStatus::Running {
            writeln!(self.output)
                .expect("FATAL DCD_TOOLS ERROR | ProgressPrinter::print (3) | Could not write to `ProgressPrinter` stream.");
        }

        self.output
            .flush()
            .expect("FATAL DCD_TOOLS ERROR | ProgressPrinter::print (4) | Could not flush `ProgressPrinter` stream.");
    }
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new()
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn read_to_string(file: &NamedTempFile) -> String {
        let mut content = String::new();
        File::open(file.path())
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn new() {
        let printer = ProgressPrinter::new();

        assert_eq!(printer.status, ProgressStatus::Running);
        assert_eq!(printer.print_freq, 100);
        assert!(printer.colored);
        assert_eq!(printer.frame_msg, "Frame".cyan());
        assert_eq!(printer.step_msg, "Step".bright_purple());
        assert_eq!(
            printer.running_msg,
            ProgressMessage::new("RUNNING".yellow())
        );
        assert_eq!(
            printer.completed_msg,
            ProgressMessage::new("COMPLETED".green())
        );
        assert_eq!(printer.failed_msg, ProgressMessage::new("FAILED!".red()));
    }

    #[test]
    fn new_complex() {
        let printer = ProgressPrinter::new()
            .with_output(Box::from(std::io::sink()))
            .with_print_freq(20)
            .with_colored(false)
            .with_frame_msg("FRAME".into())
            .with_step_msg("step".yellow())
            .with_running_msg("READING".red())
            .with_completed_msg("DONE".green())
            .with_failed_msg("FAILURE".on_bright_red());

        assert_eq!(printer.print_freq, 20);
        assert!(!printer.colored);
        assert_eq!(printer.frame_msg, "FRAME".into());
        assert_eq!(printer.step_msg, "step".yellow());
        assert_eq!(printer.running_msg, ProgressMessage::new("READING".red()));
        assert_eq!(printer.completed_msg, ProgressMessage::new("DONE".green()));
        assert_eq!(
            printer.failed_msg,
            ProgressMessage::new("FAILURE".on_bright_red())
        );
    }

    #[test]
    fn set_status() {
        let mut printer = ProgressPrinter::new();

        printer.set_status(ProgressStatus::Failed);
        assert_eq!(printer.get_status(), ProgressStatus::Failed);

        printer.set_status(ProgressStatus::Completed);
        assert_eq!(printer.get_status(), ProgressStatus::Completed);
    }

    #[test]
    #[should_panic(
        expected = "FATAL DCD_TOOLS ERROR | ProgressMessage::new | `ProgressMessage` can not be longer than 9 characters."
    )]
    fn progress_message_panic() {
        let _msg = ProgressMessage::new("SHOULD_PANIC".red());
    }

    #[test]
    #[should_panic(
        expected = "FATAL DCD_TOOLS ERROR | ProgressPrinter::with_print_freq | Printing frequency must be positive."
    )]
    fn zero_print_freq_panic() {
        let _printer = ProgressPrinter::new().with_print_freq(0);
    }

    #[test]
    fn print_with_newline() {
        let output = NamedTempFile::new().unwrap();
        let handle = output.reopen().unwrap();

        let mut printer = ProgressPrinter::new()
            .with_output(Box::from(handle))
            .with_colored(false)
            .with_print_freq(2)
            .with_terminating("\n");

        printer.print(0, 0);
        printer.print(1, 10);
        printer.print(2, 20);
        printer.set_status(ProgressStatus::Completed);
        printer.print(3, 30);

        let expected = format!(
            "[ RUNNING ]   Frame {:12} | Step {:12}\n\
             [ RUNNING ]   Frame {:12} | Step {:12}\n\
             [COMPLETED]   Frame {:12} | Step {:12}\n\n",
            0, 0, 2, 20, 3, 30
        );

        assert_eq!(read_to_string(&output), expected);
    }

    #[test]
    fn print_failed() {
        let output = NamedTempFile::new().unwrap();
        let handle = output.reopen().unwrap();

        let mut printer = ProgressPrinter::new()
            .with_output(Box::from(handle))
            .with_colored(false)
            .with_terminating("|");

        printer.print(1, 5);
        printer.set_status(ProgressStatus::Failed);
        printer.print(7, 35);

        let expected = format!("[ FAILED! ]   Frame {:12} | Step {:12}|\n", 7, 35);
        assert_eq!(read_to_string(&output), expected);
    }
}
