//! Interactive questions on the terminal.

use std::io::{self, BufRead, Write};

use trace_core::lifecycle::{Confirmation, IrreversibleOperation};
use tracing::debug;

const AFFIRMATIVE: [&str; 5] = ["y", "yes", "s", "si", "sí"];

/// Asks the user to acknowledge `operation`. `assume_yes` skips the
/// question for this invocation only. Returns `None` when declined.
pub fn confirm<R: BufRead, W: Write>(
    operation: IrreversibleOperation,
    assume_yes: bool,
    input: R,
    mut output: W,
) -> io::Result<Option<Confirmation>> {
    if assume_yes {
        debug!(%operation, "confirmed by --yes");
        return Ok(Some(Confirmation::acknowledge(operation)));
    }

    writeln!(output, "{}", operation.warning())?;
    let answer = ask("Continue? [y/N] ", input, output)?;
    let accepted = AFFIRMATIVE.contains(&answer.to_lowercase().as_str());
    Ok(accepted.then(|| Confirmation::acknowledge(operation)))
}

/// Writes `question` and reads one trimmed line. End of input is an empty
/// answer.
pub fn ask<R: BufRead, W: Write>(
    question: &str,
    mut input: R,
    mut output: W,
) -> io::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
