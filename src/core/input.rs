use crate::domain::model::{SalesRecord, ITEM_COUNT};
use crate::utils::error::{InputError, Result, SheetsError};
use std::io::{BufRead, Write};

const INSTRUCTIONS: [&str; 3] = [
    "Please enter sales data from the last market.",
    "Data should be six numbers, separated by commas.",
    "Example: 10,20,30,40,50,60\n",
];

const PROMPT: &str = "Enter your data here: ";

/// Parses split operator input into a sales record.
///
/// Every token is parsed before the count is checked, so a line with both a
/// bad token and the wrong count reports the bad token.
pub fn validate_data<S: AsRef<str>>(
    values: &[S],
    trim_whitespace: bool,
) -> std::result::Result<SalesRecord, InputError> {
    let mut parsed = Vec::with_capacity(values.len());
    for value in values {
        let raw = value.as_ref();
        let token = if trim_whitespace { raw.trim() } else { raw };
        let number = token
            .parse::<i64>()
            .map_err(|_| InputError::NotAnInteger {
                value: raw.to_string(),
            })?;
        parsed.push(number);
    }

    let values: [i64; ITEM_COUNT] =
        parsed
            .try_into()
            .map_err(|rejected: Vec<i64>| InputError::WrongCount {
                expected: ITEM_COUNT,
                found: rejected.len(),
            })?;
    Ok(SalesRecord::new(values))
}

pub fn validate<S: AsRef<str>>(values: &[S], trim_whitespace: bool) -> bool {
    validate_data(values, trim_whitespace).is_ok()
}

enum PromptState {
    AwaitingInput { attempt: usize },
    Validating { attempt: usize, line: String },
    Accepted(SalesRecord),
}

/// Interactive loop that keeps asking until a valid line is entered.
///
/// Unbounded by default. `max_attempts` caps it for scripted runs, and end of
/// input always stops it.
pub struct SalesPrompt<R, W> {
    reader: R,
    writer: W,
    trim_whitespace: bool,
    max_attempts: Option<usize>,
}

impl SalesPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> SalesPrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            trim_whitespace: true,
            max_attempts: None,
        }
    }

    pub fn with_trim_whitespace(mut self, trim_whitespace: bool) -> Self {
        self.trim_whitespace = trim_whitespace;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<usize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    pub fn get_sales_data(&mut self) -> Result<SalesRecord> {
        let mut state = PromptState::AwaitingInput { attempt: 1 };

        loop {
            state = match state {
                PromptState::AwaitingInput { attempt } => {
                    if let Some(max) = self.max_attempts {
                        if attempt > max {
                            tracing::warn!("Giving up after {} invalid entries", max);
                            return Err(SheetsError::AttemptsExhausted { attempts: max });
                        }
                    }
                    self.print_instructions()?;
                    match self.read_line()? {
                        Some(line) => PromptState::Validating { attempt, line },
                        None => return Err(SheetsError::InputClosed),
                    }
                }
                PromptState::Validating { attempt, line } => {
                    let values: Vec<&str> = line.split(',').collect();
                    match validate_data(&values, self.trim_whitespace) {
                        Ok(record) => {
                            writeln!(self.writer, "Data is valid")?;
                            PromptState::Accepted(record)
                        }
                        Err(e) => {
                            tracing::debug!("Attempt {} rejected: {}", attempt, e);
                            writeln!(self.writer, "Invalid data: {}, please try again.\n", e)?;
                            PromptState::AwaitingInput {
                                attempt: attempt + 1,
                            }
                        }
                    }
                }
                PromptState::Accepted(record) => return Ok(record),
            };
        }
    }

    fn print_instructions(&mut self) -> Result<()> {
        for line in INSTRUCTIONS {
            writeln!(self.writer, "{}", line)?;
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        write!(self.writer, "{}", PROMPT)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}
