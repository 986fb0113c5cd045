//! Operator prompt for the curation loop.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::domain::{Candidate, Form};

pub const PROMPT: &str = "[y]es / [s]kip / [d]ecline form / [q]uit";

/// Operator input at the candidate prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Accept,
    Skip,
    Decline,
    Quit,
}

/// Parse one line of operator input
pub fn parse_choice(input: &str) -> Option<Choice> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Choice::Accept),
        "s" | "skip" => Some(Choice::Skip),
        "d" | "decline" => Some(Choice::Decline),
        "q" | "quit" => Some(Choice::Quit),
        _ => None,
    }
}

/// Ask until the operator gives a valid answer. End of input means quit.
pub fn ask(input: &mut impl BufRead, output: &mut impl Write) -> Result<Choice> {
    loop {
        write!(output, "{}: ", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read operator input")?;
        if read == 0 {
            return Ok(Choice::Quit);
        }

        match parse_choice(&line) {
            Some(choice) => return Ok(choice),
            None if line.trim().is_empty() => continue,
            None => writeln!(output, "Unknown choice '{}'", line.trim())?,
        }
    }
}

/// Ask on the terminal
pub fn ask_stdin() -> Result<Choice> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    ask(&mut stdin.lock(), &mut stdout)
}

pub fn print_form(form: &Form, position: usize, candidates: usize) {
    println!();
    println!("{}", "=".repeat(60));
    print!("Form {}: {}", position, form);
    if let Some(category) = &form.lexical_category {
        print!(" [{}]", category);
    }
    println!();
    println!("{} candidate(s)", candidates);
}

pub fn print_candidate(candidate: &Candidate, remaining: usize) {
    println!();
    println!("  \"{}\"", candidate.text);
    let provenance = &candidate.provenance;
    let mut origin = format!("  {} / {}", provenance.source, provenance.record_id);
    if let Some(title) = &provenance.document_title {
        origin.push_str(&format!(" ({})", title));
    }
    if let Some(date) = provenance.date {
        origin.push_str(&format!(", {}", date.format("%Y-%m-%d")));
    }
    println!("{}", origin);
    if let Some(url) = &provenance.url {
        println!("  {}", url);
    }
    println!("  {} words, {} more after this", candidate.word_count, remaining);
}
