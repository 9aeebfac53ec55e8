//! Reviewers answer the "which entries to keep" question for a duplicate
//! group.
//!
//! [`ConsoleReviewer`] talks to a person over a reader/writer pair (stdin and
//! stdout in the binary). [`ScriptedReviewer`] replays canned answers.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use imtidy_bibtex::BibTeXEntry;

use crate::resolution::{DuplicateCluster, SelectionError};

/// Source of keep/drop decisions for duplicate groups
pub trait Reviewer {
    /// Show the ranked group. Called once per group.
    fn present(&mut self, cluster: &DuplicateCluster<'_>) -> io::Result<()>;

    /// Ask for the 1-based numbers of the entries to keep.
    ///
    /// Returns the raw answer. End of input is an error.
    fn ask(&mut self, cluster: &DuplicateCluster<'_>) -> io::Result<String>;

    /// Report why the last answer was refused. [`Reviewer::ask`] follows.
    fn reject(&mut self, cluster: &DuplicateCluster<'_>, error: &SelectionError)
        -> io::Result<()>;
}

/// Render an entry the way it is shown during review.
///
/// Fields use two-space indentation and are always braced.
pub fn format_for_review(entry: &BibTeXEntry) -> String {
    let mut out = format!("@{}{{{},\n", entry.entry_type, entry.cite_key);
    for field in &entry.fields {
        out.push_str(&format!("  {} = {{{}}},\n", field.key, field.value));
    }
    out.push_str("}\n");
    out
}

/// Interactive reviewer over a line-based reader and a writer
pub struct ConsoleReviewer<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleReviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the reader and writer
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl ConsoleReviewer<io::StdinLock<'static>, io::Stdout> {
    /// Reviewer on the process's standard input and output
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Reviewer for ConsoleReviewer<R, W> {
    fn present(&mut self, cluster: &DuplicateCluster<'_>) -> io::Result<()> {
        writeln!(self.output, "\nFound duplicates:")?;
        for (i, member) in cluster.members().iter().enumerate() {
            writeln!(self.output, "{}.\n{}", i + 1, format_for_review(member.entry))?;
        }
        self.output.flush()
    }

    fn ask(&mut self, cluster: &DuplicateCluster<'_>) -> io::Result<String> {
        write!(
            self.output,
            "Choose the entries to keep (1-{}) (separate by commas): ",
            cluster.len()
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a selection was made",
            ));
        }

        let answer = line.strip_suffix('\n').unwrap_or(&line);
        let answer = answer.strip_suffix('\r').unwrap_or(answer);
        Ok(answer.to_string())
    }

    fn reject(
        &mut self,
        _cluster: &DuplicateCluster<'_>,
        error: &SelectionError,
    ) -> io::Result<()> {
        writeln!(self.output, "{error}")?;
        self.output.flush()
    }
}

/// Reviewer that replays queued answers and records what it was shown
#[derive(Debug, Default)]
pub struct ScriptedReviewer {
    answers: VecDeque<String>,
    presented: Vec<Vec<String>>,
    rejections: Vec<SelectionError>,
}

impl ScriptedReviewer {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Cite keys of every group presented, in ranked order
    pub fn presented(&self) -> &[Vec<String>] {
        &self.presented
    }

    /// Refused answers, oldest first
    pub fn rejections(&self) -> &[SelectionError] {
        &self.rejections
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Reviewer for ScriptedReviewer {
    fn present(&mut self, cluster: &DuplicateCluster<'_>) -> io::Result<()> {
        self.presented
            .push(cluster.cite_keys().into_iter().map(str::to_string).collect());
        Ok(())
    }

    fn ask(&mut self, _cluster: &DuplicateCluster<'_>) -> io::Result<String> {
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answers left")
        })
    }

    fn reject(
        &mut self,
        _cluster: &DuplicateCluster<'_>,
        error: &SelectionError,
    ) -> io::Result<()> {
        self.rejections.push(error.clone());
        Ok(())
    }
}
