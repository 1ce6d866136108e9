//! Terminal prompt for restoring the saved position.

use std::io::{BufRead, Write};

use eyre::WrapErr;
use tracker_core::{RestoreOutcome, Tracker};

/// Ask until the answer is y/yes or n/no. EOF counts as no.
pub fn ask_yes_no(
    input: &mut impl BufRead,
    out: &mut impl Write,
    question: &str,
) -> std::io::Result<bool> {
    loop {
        write!(out, "{question} [y/n] ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(false);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(out, "Please answer y or n.")?,
        }
    }
}

/// Offer to restore until the operator declines or the record was found.
///
/// Returns whether a saved position was restored.
pub fn restore_interactive(
    tracker: &mut Tracker,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> eyre::Result<bool> {
    loop {
        let yes = ask_yes_no(
            input,
            out,
            "Restore the saved position and drive back to origin?",
        )
        .wrap_err("reading restore answer")?;
        if !yes {
            tracing::info!("restore declined; current position is origin");
            return Ok(false);
        }
        match tracker.restore_saved()? {
            RestoreOutcome::Restored(_) => return Ok(true),
            RestoreOutcome::StoreMissing => {
                writeln!(
                    out,
                    "No saved position found. Put the position file in place and answer y to retry, or n to skip."
                )?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case("y\n", true)]
    #[case("YES\n", true)]
    #[case("n\n", false)]
    #[case("maybe\nno\n", false)]
    #[case("\n\ny\n", true)]
    #[case("", false)]
    fn answers(#[case] typed: &str, #[case] expected: bool) {
        let mut input = Cursor::new(typed.as_bytes());
        let mut out = Vec::new();
        assert_eq!(ask_yes_no(&mut input, &mut out, "Go?").unwrap(), expected);
    }

    #[test]
    fn unclear_answer_repeats_the_question() {
        let mut input = Cursor::new("what\ny\n".as_bytes());
        let mut out = Vec::new();
        ask_yes_no(&mut input, &mut out, "Go?").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Go? [y/n]").count(), 2);
        assert!(text.contains("Please answer y or n."));
    }
}
